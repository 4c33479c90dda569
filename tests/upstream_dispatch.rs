//! Tests for the upstream dispatcher against a raw mock backend.

use std::sync::Arc;

use ankibridge::config::schema::UpstreamConfig;
use ankibridge::dispatch::{ApiDispatcher, UpstreamDispatcher};

mod common;

use common::{spawn_gateway, start_mock_upstream, StaticSettings};

#[tokio::test]
async fn test_payload_forwarded_and_reply_passed_through() {
    let upstream = start_mock_upstream("{\"result\":6,\"error\":null}").await;

    let config = UpstreamConfig {
        url: format!("http://{upstream}/"),
        timeout_secs: 5,
    };
    let dispatcher = UpstreamDispatcher::new(&config).unwrap();

    let reply = dispatcher
        .dispatch(Some("{\"action\":\"version\"}"), &Default::default())
        .await
        .unwrap();

    assert_eq!(reply.status, 200);
    assert_eq!(reply.content_type, "application/json");
    assert_eq!(reply.body, b"{\"result\":6,\"error\":null}");
}

#[tokio::test]
async fn test_unreachable_upstream_is_an_error() {
    let config = UpstreamConfig {
        // Reserved port with nothing listening.
        url: "http://127.0.0.1:1/".to_string(),
        timeout_secs: 1,
    };
    let dispatcher = UpstreamDispatcher::new(&config).unwrap();

    let err = dispatcher
        .dispatch(Some("{\"action\":\"version\"}"), &Default::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("upstream request failed"));
}

#[tokio::test]
async fn test_gateway_end_to_end_through_upstream() {
    let upstream = start_mock_upstream("{\"result\":[\"Default\"],\"error\":null}").await;
    let dispatcher = Arc::new(
        UpstreamDispatcher::new(&UpstreamConfig {
            url: format!("http://{upstream}/"),
            timeout_secs: 5,
        })
        .unwrap(),
    );

    let addr = spawn_gateway(dispatcher, StaticSettings::empty()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/"))
        .header("Content-Type", "application/json")
        .body("{\"action\":\"deckNames\",\"version\":6}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.text().await.unwrap(),
        "{\"result\":[\"Default\"],\"error\":null}"
    );
}
