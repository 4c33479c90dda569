//! Upstream dispatcher.
//!
//! Forwards payloads to a flashcard API served elsewhere (typically a local
//! Anki instance with the AnkiConnect add-on) and passes its reply through
//! untouched.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::Client;
use url::Url;

use crate::config::schema::UpstreamConfig;
use crate::dispatch::{ApiDispatcher, DispatchError, DispatchReply, Params, JSON_CONTENT_TYPE};

/// Dispatcher that forwards to an upstream HTTP endpoint.
pub struct UpstreamDispatcher {
    client: Client,
    url: Url,
}

impl UpstreamDispatcher {
    /// Create a dispatcher towards the configured upstream.
    pub fn new(config: &UpstreamConfig) -> Result<Self, DispatchError> {
        let url = Url::parse(&config.url).map_err(|e| DispatchError::Upstream(e.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DispatchError::Upstream(e.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl ApiDispatcher for UpstreamDispatcher {
    async fn dispatch(
        &self,
        payload: Option<&str>,
        params: &Params,
    ) -> Result<DispatchReply, DispatchError> {
        let request = match payload {
            // The raw posted body is preferred and forwarded verbatim.
            Some(body) => self
                .client
                .post(self.url.clone())
                .header(reqwest::header::CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(body.to_string()),
            // Query-only requests (older clients) forward as a query string.
            None => {
                let mut url = self.url.clone();
                {
                    let mut pairs = url.query_pairs_mut();
                    for (name, values) in params {
                        for value in values {
                            pairs.append_pair(name, value);
                        }
                    }
                }
                self.client.get(url)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| DispatchError::Upstream(e.to_string()))?;

        let status =
            StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(JSON_CONTENT_TYPE)
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| DispatchError::Upstream(e.to_string()))?;

        Ok(DispatchReply {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
