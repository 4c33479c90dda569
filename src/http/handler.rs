//! The gateway request handler.
//!
//! # Responsibilities
//! - Extract the request payload (query parameters, raw posted body, or a
//!   multipart `postData` field)
//! - Answer a fixed liveness response when no payload is present
//! - Forward payloads to the dispatcher port and render its reply
//! - Attach private-network-access and CORS headers
//!
//! # Design Decisions
//! - Body decode failures are logged and swallowed; the request continues
//!   with whatever was parsed, which usually routes into the liveness branch
//! - Bodies are decoded as UTF-8 regardless of the client's content-type
//! - CORS decoration runs last, on every branch

use std::time::Instant;

use axum::body::Body;
use axum::extract::{FromRequest, Multipart, State};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, ORIGIN};
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::dispatch::{DispatchReply, Params};
use crate::http::cors::apply_cors_headers;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::settings::CORS_HOSTS_KEY;

/// Fixed body returned when a request carries no payload.
pub const LIVENESS_BODY: &str = "Ankiconnect Android is running.";

/// Multipart field carrying the posted payload.
const POST_DATA_FIELD: &str = "postData";

const PRIVATE_NETWORK_REQUEST: &str = "access-control-request-private-network";
const PRIVATE_NETWORK_RESPONSE: &str = "access-control-allow-private-network";

/// Entry point for every request on the gateway route.
pub async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let params = parse_query(request.uri().query());
    let request_headers = request.headers().clone();
    let post_data = extract_post_data(request).await;

    // No data at all: answer the plain liveness probe.
    if params.is_empty() && post_data.is_none() {
        let mut response = (StatusCode::OK, LIVENESS_BODY).into_response();
        decorate_cors(&state, &request_headers, &mut response);
        metrics::record_request(&method, response.status().as_u16(), "liveness", start);
        return response;
    }

    let mut response = match state.dispatcher.dispatch(post_data.as_deref(), &params).await {
        Ok(reply) => render_reply(reply),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch failed");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    };

    // Browsers enforcing private network access need this in addition to a
    // matching public origin in the allow-list.
    if private_network_requested(&request_headers) {
        response.headers_mut().insert(
            HeaderName::from_static(PRIVATE_NETWORK_RESPONSE),
            HeaderValue::from_static("true"),
        );
    }

    decorate_cors(&state, &request_headers, &mut response);
    metrics::record_request(&method, response.status().as_u16(), "dispatch", start);
    response
}

/// Run the CORS decorator over an outgoing response.
///
/// Reads the allow-list fresh from the settings store on every request, so
/// external edits apply without restarting.
fn decorate_cors(state: &AppState, request_headers: &HeaderMap, response: &mut Response) {
    let cors_hosts = state.settings.get_or(CORS_HOSTS_KEY, "");
    // HeaderMap lookups are case-insensitive, covering both the `origin` and
    // `Origin` spellings.
    let origin = request_headers.get(ORIGIN).and_then(|v| v.to_str().ok());
    apply_cors_headers(response.headers_mut(), &cors_hosts, origin);
}

fn render_reply(reply: DispatchReply) -> Response {
    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = reply.status;
    if let Ok(value) = HeaderValue::from_str(&reply.content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

fn private_network_requested(headers: &HeaderMap) -> bool {
    headers
        .get(PRIVATE_NETWORK_REQUEST)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Parse URL query parameters into a multimap.
fn parse_query(query: Option<&str>) -> Params {
    let mut params = Params::new();
    if let Some(query) = query {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    params
}

/// Pull the posted payload out of the request, if any.
///
/// Multipart bodies contribute their `postData` field; any other non-empty
/// body is taken verbatim, decoded as UTF-8. Decode failures are logged and
/// swallowed so the request can still fall through to the liveness branch.
async fn extract_post_data(request: Request<Body>) -> Option<String> {
    if request.method() == Method::GET || request.method() == Method::HEAD {
        return None;
    }

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = match Multipart::from_request(request, &()).await {
            Ok(multipart) => multipart,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart body");
                return None;
            }
        };
        loop {
            match multipart.next_field().await {
                Ok(Some(field)) => {
                    if field.name() == Some(POST_DATA_FIELD) {
                        match field.text().await {
                            Ok(text) => return Some(text),
                            Err(e) => {
                                tracing::warn!(error = %e, "Failed to decode postData field");
                                return None;
                            }
                        }
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed multipart body");
                    return None;
                }
            }
        }
    }

    // Size is already bounded by the request body limit layer.
    match axum::body::to_bytes(request.into_body(), usize::MAX).await {
        Ok(bytes) if !bytes.is_empty() => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            None
        }
    }
}
