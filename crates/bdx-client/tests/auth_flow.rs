//! Integration tests for the auth/session endpoints and content negotiation.

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bdx_client::api::{Method, RequestBody};
use bdx_client::{ApiClient, Payload, SessionStore};
use bdx_types::{NewItem, TokenPair};

fn client_with_store(server: &MockServer, temp: &TempDir) -> (ApiClient, Arc<SessionStore>) {
    let store = Arc::new(SessionStore::open(temp.path()).unwrap());
    let client = ApiClient::new(&server.uri(), store.clone()).unwrap();
    (client, store)
}

/// Login posts URL-encoded credentials (no JSON content type) and persists
/// the returned pair; subsequent requests carry the bearer.
#[tokio::test]
async fn test_login_is_form_encoded_and_persists_tokens() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let (client, store) = client_with_store(&server, &temp);

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=player%40example.com"))
        .and(body_string_contains("password=pass"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A1",
            "refresh_token": "R1",
            "token_type": "bearer",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/inventory"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let pair = client.login("player@example.com", "pass").await.unwrap();
    assert_eq!(pair, TokenPair::new("A1", "R1"));
    assert_eq!(store.email().as_deref(), Some("player@example.com"));

    let inventory = client.inventory().await.unwrap();
    assert_eq!(inventory, json!([]));
}

/// Registration conflicts surface as status-tagged errors the caller can
/// choose to ignore.
#[tokio::test]
async fn test_register_conflict_is_status_tagged() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let (client, _store) = client_with_store(&server, &temp);

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"detail": "Email already registered"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client.register("player@example.com", "pass").await.unwrap_err();
    assert_eq!(err.status(), Some(409));
}

/// No active item: a JSON `null` body maps to `None`, and creating an item
/// persists its id as the active item.
#[tokio::test]
async fn test_active_item_empty_then_create() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let (client, store) = client_with_store(&server, &temp);
    store
        .set_tokens(Some(&TokenPair::new("A1", "R1")))
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/items/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "title": "Mystery",
            "description": "Random",
            "base_price": 10.0,
            "status": "scheduled",
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.active_item().await.unwrap().is_none());

    let item = NewItem {
        title: "Mystery".to_string(),
        description: "Random".to_string(),
        base_price: 10.0,
        close_at: chrono::Utc::now() + chrono::Duration::hours(1),
    };
    let created = client.create_item(&item).await.unwrap();
    assert_eq!(created.id, 42);
    assert_eq!(store.active_item(), Some(42));
}

/// Logout revokes server-side (best effort) and clears every persisted key.
#[tokio::test]
async fn test_logout_clears_session() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let (client, store) = client_with_store(&server, &temp);
    store
        .set_tokens(Some(&TokenPair::new("A1", "R1")))
        .unwrap();
    store.set_email("player@example.com").unwrap();
    store.set_active_item(Some(42)).unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "Logged out"})))
        .expect(1)
        .mount(&server)
        .await;

    client.logout().await.unwrap();
    assert!(store.tokens().is_none());
    assert!(store.email().is_none());
    assert!(store.active_item().is_none());
    assert!(!temp.path().join("refresh_token").exists());
}

/// Non-JSON responses come back as raw text.
#[tokio::test]
async fn test_plain_text_response_decoding() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let (client, _store) = client_with_store(&server, &temp);

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let payload = client
        .request(Method::GET, "/health", &RequestBody::Empty)
        .await
        .unwrap();
    match payload {
        Payload::Text(text) => assert_eq!(text, "pong"),
        Payload::Json(_) => panic!("expected text payload"),
    }
}
