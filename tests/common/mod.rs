//! Shared fakes and helpers for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ankibridge::config::GatewayConfig;
use ankibridge::dispatch::{ApiDispatcher, DispatchError, DispatchReply, Params};
use ankibridge::http::{AppState, HttpServer};
use ankibridge::settings::SettingsStore;

/// In-memory settings fake.
pub struct StaticSettings {
    values: HashMap<String, String>,
}

impl StaticSettings {
    pub fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            values: pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        })
    }

    #[allow(dead_code)]
    pub fn empty() -> Arc<Self> {
        Self::new(&[])
    }
}

impl SettingsStore for StaticSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Dispatcher fake that records calls and returns a canned reply.
pub struct RecordingDispatcher {
    pub calls: Mutex<Vec<(Option<String>, Params)>>,
    reply: DispatchReply,
}

impl RecordingDispatcher {
    pub fn new(reply: DispatchReply) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply,
        })
    }

    pub fn ok_json(body: &str) -> Arc<Self> {
        Self::new(DispatchReply::json(StatusCode::OK, body))
    }
}

#[async_trait]
impl ApiDispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        payload: Option<&str>,
        params: &Params,
    ) -> Result<DispatchReply, DispatchError> {
        self.calls
            .lock()
            .unwrap()
            .push((payload.map(str::to_string), params.clone()));
        Ok(self.reply.clone())
    }
}

/// Spawn a gateway on an ephemeral port, returning its address.
pub async fn spawn_gateway(
    dispatcher: Arc<dyn ApiDispatcher>,
    settings: Arc<dyn SettingsStore>,
) -> SocketAddr {
    let state = AppState {
        dispatcher,
        settings,
    };
    let app = HttpServer::build_router(&GatewayConfig::default(), state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a mock upstream that reads one request and answers with a fixed
/// JSON reply.
#[allow(dead_code)]
pub async fn start_mock_upstream(response_body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        // Drain enough of the request for small payloads.
                        let mut buf = vec![0u8; 64 * 1024];
                        let _ = socket.read(&mut buf).await;
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response_body.len(),
                            response_body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}
