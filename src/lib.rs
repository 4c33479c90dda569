//! AnkiConnect-compatible HTTP gateway library.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod observability;
pub mod settings;

pub use config::GatewayConfig;
pub use http::HttpServer;
