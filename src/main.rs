//! AnkiConnect-compatible HTTP gateway.
//!
//! Bridges browser extensions and other local clients to a flashcard API.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────┐
//!                    │                 ANKIBRIDGE                  │
//!                    │                                             │
//!   Client Request   │  ┌─────────┐    ┌──────────┐    ┌────────┐ │
//!   ─────────────────┼─▶│  http   │───▶│ handler  │───▶│dispatch│─┼──▶ Flashcard
//!                    │  │ server  │    │          │    │  port  │ │     API
//!                    │  └─────────┘    └────┬─────┘    └────────┘ │
//!                    │                      │                     │
//!   Client Response  │  ┌─────────┐    ┌────▼─────┐               │
//!   ◀────────────────┼──│response │◀───│  cors    │◀── settings   │
//!                    │  │         │    │decorator │    allow-list │
//!                    │  └─────────┘    └──────────┘               │
//!                    └────────────────────────────────────────────┘
//! ```
//!
//! Per request: extract the payload (query parameters, raw JSON body, or a
//! multipart `postData` field), answer a fixed liveness response when there
//! is none, otherwise forward to the dispatcher; then decorate the response
//! with CORS headers from the user-editable `cors_host` allow-list.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ankibridge::config::{load_config, GatewayConfig};
use ankibridge::dispatch::UpstreamDispatcher;
use ankibridge::http::HttpServer;
use ankibridge::settings::{FileSettings, SettingsWatcher};

#[derive(Parser, Debug)]
#[command(name = "ankibridge", about = "AnkiConnect-compatible HTTP gateway")]
struct Cli {
    /// Path to the gateway configuration file (TOML).
    #[arg(long, default_value = "ankibridge.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ankibridge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("ankibridge v0.1.0 starting");

    let cli = Cli::parse();

    // A missing config file is not an error; the defaults cover local use.
    let config = if cli.config.exists() {
        load_config(&cli.config)?
    } else {
        tracing::info!(path = ?cli.config, "No config file found, using defaults");
        GatewayConfig::default()
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        settings_path = ?config.settings.path,
        "Configuration loaded"
    );

    // Initialize metrics exporter
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            ankibridge::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // The settings file is rewritten by an external editor; the watcher keeps
    // the in-memory snapshot current. Its handle must stay alive.
    let settings = Arc::new(FileSettings::load(&config.settings.path));
    let _watcher = match SettingsWatcher::new(&config.settings.path, settings.clone()).run() {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "Settings watcher unavailable, edits require a restart");
            None
        }
    };

    let dispatcher = Arc::new(UpstreamDispatcher::new(&config.upstream)?);

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Create and run HTTP server
    let server = HttpServer::new(config, dispatcher, settings);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
