//! HTTP gateway subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum setup, request id, timeout, body limit)
//!     → handler.rs (payload extraction → liveness or dispatch)
//!     → [dispatch port forwards to the flashcard API]
//!     → cors.rs (decorate response from the allow-list)
//!     → send to client
//! ```

pub mod cors;
pub mod handler;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
