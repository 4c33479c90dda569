//! API dispatch subsystem.
//!
//! # Responsibilities
//! - Define the dispatcher port consumed by the HTTP handler
//! - Forward payloads to the upstream flashcard API
//! - Map transport failures to gateway errors
//!
//! # Design Decisions
//! - The handler never sees transport details; it gets a reply or a
//!   `DispatchError` and decides the HTTP status itself
//! - One dispatcher instance per server lifetime, shared via `Arc`
//! - Replies carry their own content type; the gateway never rewrites bodies

pub mod upstream;

pub use upstream::UpstreamDispatcher;

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::StatusCode;
use thiserror::Error;

/// Parsed request parameters: values per name in arrival order; name order
/// is unspecified.
pub type Params = HashMap<String, Vec<String>>;

/// Content type used for dispatched payloads and default replies.
///
/// UTF-8 is forced regardless of what the client declared, so payloads
/// decode consistently.
pub const JSON_CONTENT_TYPE: &str = "text/json; charset=UTF-8";

/// A fully-formed reply from the API dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchReply {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl DispatchReply {
    /// Reply with the default JSON content type.
    pub fn json(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: JSON_CONTENT_TYPE.to_string(),
            body: body.into(),
        }
    }
}

/// Errors crossing the dispatcher boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("upstream request failed: {0}")]
    Upstream(String),
}

/// Port to the flashcard API.
///
/// `payload` is the raw posted body (or the multipart `postData` field) when
/// one was present; `params` are the parsed query parameters. Implementations
/// return a fully-formed reply; the handler only decorates headers on top.
#[async_trait]
pub trait ApiDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        payload: Option<&str>,
        params: &Params,
    ) -> Result<DispatchReply, DispatchError>;
}
