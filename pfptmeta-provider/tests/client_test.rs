#![allow(clippy::unwrap_used)]
// Integration tests for `MetaClient` using wiremock.

use std::collections::HashMap;

use pfptmeta_core::resource::Value;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pfptmeta_provider::{ApiError, MetaClient, ProviderConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> ProviderConfig {
    let block = HashMap::from([
        ("api_key".to_string(), Value::from("key-1")),
        ("api_secret".to_string(), Value::from("s3cret")),
        ("org_shortname".to_string(), Value::from("acme")),
        ("base_url".to_string(), Value::from(server.uri())),
    ]);
    ProviderConfig::load(&block).unwrap()
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=org%3Aacme"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-1", "expires_in": 3600})),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn setup() -> (MockServer, MetaClient) {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    let client = match MetaClient::connect(config(&server)).await {
        Ok(client) => client,
        Err(e) => panic!("connect failed: {e}"),
    };
    (server, client)
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_token_is_fetched_once_and_reused() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/usr-1"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "usr-1"})))
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..2 {
        let user: serde_json::Value = client.get("v1/users/usr-1").await.unwrap();
        assert_eq!(user["id"], "usr-1");
    }
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "invalid client"})),
        )
        .mount(&server)
        .await;

    match MetaClient::connect(config(&server)).await {
        Err(ApiError::Authentication { message }) => {
            assert!(message.contains("invalid client"), "{message}");
        }
        Err(other) => panic!("expected Authentication error, got: {other:?}"),
        Ok(_) => panic!("expected Authentication error"),
    }
}

// ── Error handling tests ────────────────────────────────────────────

#[tokio::test]
async fn test_api_message_and_body_are_kept() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/groups"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"detail": "name already taken"})),
        )
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, _> =
        client.post("v1/groups", &json!({"name": "admins"})).await;

    match result {
        Err(ApiError::Status {
            status,
            message,
            body,
        }) => {
            assert_eq!(status, 409);
            assert_eq!(message, "name already taken");
            assert!(body.contains("name already taken"));
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_is_distinguished() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/roles/rol-gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client
        .get::<serde_json::Value>("v1/roles/rol-gone")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_empty_body_decodes_as_null() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/devices/dev-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client.delete("v1/devices/dev-1").await.unwrap();
}

#[tokio::test]
async fn test_unexpected_shape_is_a_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let err = client.list::<serde_json::Value>("v1/users").await.unwrap_err();
    assert!(
        matches!(err, ApiError::Deserialization { .. }),
        "expected Deserialization error, got: {err:?}"
    );
}
