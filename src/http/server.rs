//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router and shared state
//! - Wire up middleware (request id, timeout, body limit, tracing)
//! - Bind the server to a listener and serve until shutdown
//!
//! # Design Decisions
//! - Collaborators (dispatcher, settings) are constructed once per server
//!   lifetime and injected as trait objects, so tests swap in fakes
//! - A request runs dispatch and CORS decoration synchronously to completion;
//!   nothing is shared between requests beyond the injected collaborators

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::dispatch::ApiDispatcher;
use crate::http::handler::gateway_handler;
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::settings::SettingsStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<dyn ApiDispatcher>,
    pub settings: Arc<dyn SettingsStore>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and collaborators.
    pub fn new(
        config: GatewayConfig,
        dispatcher: Arc<dyn ApiDispatcher>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let state = AppState {
            dispatcher,
            settings,
        };
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The single route answers every method: GET and POST carry payloads,
    /// and OPTIONS preflights fall through to the liveness branch, which is
    /// still CORS-decorated.
    pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);
        Router::new()
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
