#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dockboard_api::{Error, RestClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let token: SecretString = "test-token".to_string().into();
    let client = RestClient::new(base_url, &token, &TransportConfig::default()).unwrap();
    (server, client)
}

// ── Status ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_api_status_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "API running." })))
        .mount(&server)
        .await;

    let status = client.api_status().await.unwrap();
    assert_eq!(status.message, "API running.");
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
        .mount(&server)
        .await;

    let result = client.api_status().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── States ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_states() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "entity_id": "switch.docker_integration_containers_c1",
                "state": "on",
                "attributes": { "friendly_name": "web" },
                "last_changed": "2026-02-10T12:00:00+00:00"
            },
            {
                "entity_id": "binary_sensor.postgres_data",
                "state": "off",
                "attributes": { "mount": "/var/lib/docker/volumes/postgres_data/_data" }
            }
        ])))
        .mount(&server)
        .await;

    let states = client.states().await.unwrap();
    assert_eq!(states.len(), 2);
    assert_eq!(states[0].state, "on");
    assert_eq!(states[1].attributes["mount"], "/var/lib/docker/volumes/postgres_data/_data");
}

#[tokio::test]
async fn test_unknown_state_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states/sensor.missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Entity not found." })))
        .mount(&server)
        .await;

    assert!(client.state("sensor.missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_states_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let result = client.states().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Services ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_call_service_posts_payload() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/services/docker_integration/restart"))
        .and(body_json(json!({ "id": "c1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .call_service("docker_integration", "restart", &json!({ "id": "c1" }))
        .await
        .unwrap();
    assert_eq!(response, json!([]));
}

#[tokio::test]
async fn test_call_service_host_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/services/docker_integration/remove"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Container is running" })))
        .mount(&server)
        .await;

    let err = client
        .call_service("docker_integration", "remove", &json!({ "id": "c1" }))
        .await
        .unwrap_err();
    match err {
        Error::Host { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Container is running");
        }
        other => panic!("expected Host error, got: {other:?}"),
    }
}
