//! HTTP-level tests driving the router with `oneshot`.

use std::collections::HashMap;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use noteshare::api::ApiServer;
use noteshare::config::AppConfig;
use noteshare::database::{init_pool_with_size, run_migrations};
use noteshare::services::ServiceContainer;

struct TestApp {
    router: Router,
    _container: ServiceContainer,
}

async fn spawn_app() -> TestApp {
    let pool = init_pool_with_size("sqlite::memory:", 1)
        .await
        .expect("Failed to create test pool");
    run_migrations(&pool).await.expect("Failed to run migrations");

    let vars: HashMap<&str, &str> = [("JWT_SECRET", "http-test-secret"), ("DIGEST_ENABLED", "false")]
        .into_iter()
        .collect();
    let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("Failed to build config");

    let container = ServiceContainer::new(pool, &config).expect("Failed to build services");
    let router = ApiServer::new(config.server.clone(), container.app_state()).build_router();

    TestApp {
        router,
        _container: container,
    }
}

impl TestApp {
    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Register and log in; returns (user id, token).
    async fn sign_up(&self, username: &str) -> (i64, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "secret123",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let id = body["user"]["id"].as_i64().unwrap();

        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({
                    "email": format!("{}@example.com", username),
                    "password": "secret123",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        (id, body["token"].as_str().unwrap().to_string())
    }

    async fn create_note(&self, token: &str, content: &str) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/notes",
                Some(token),
                Some(json!({ "title": "Weekend plans", "content": content, "typeId": 18 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;
    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(
        body["notifications"]["channels"],
        json!(["socket", "email", "webhook"])
    );
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_app().await;

    let (status, _) = app.request(Method::GET, "/api/notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, "/api/timeline", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_validation() {
    let app = spawn_app().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "bad name", "email": "x@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "username");

    app.sign_up("alice").await;
    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "alice2", "email": "alice@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_bad_login_is_unauthorized() {
    let app = spawn_app().await;
    app.sign_up("alice").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_note_with_unknown_type() {
    let app = spawn_app().await;
    let (_, token) = app.sign_up("alice").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/notes",
            Some(&token),
            Some(json!({ "title": "Weekend", "content": "Hike", "typeId": 999 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_flow() {
    let app = spawn_app().await;
    let (alice_id, alice) = app.sign_up("alice").await;
    let (bob_id, bob) = app.sign_up("bob").await;
    let note_id = app.create_note(&alice, "Hike at nine").await;
    let share_uri = format!("/api/notes/{}/share", note_id);

    // Self-share
    let (status, body) = app
        .request(
            Method::POST,
            &share_uri,
            Some(&alice),
            Some(json!({ "recipientIds": [alice_id] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["reason"], "self-share");

    // Not the sender
    let (status, _) = app
        .request(
            Method::POST,
            &share_uri,
            Some(&bob),
            Some(json!({ "recipientIds": [alice_id] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Missing note
    let (status, _) = app
        .request(
            Method::POST,
            "/api/notes/9999/share",
            Some(&alice),
            Some(json!({ "recipientIds": [bob_id] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Success
    let (status, body) = app
        .request(
            Method::POST,
            &share_uri,
            Some(&alice),
            Some(json!({ "recipientIds": [bob_id] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Note shared successfully");

    // Already shared
    let (status, body) = app
        .request(
            Method::POST,
            &share_uri,
            Some(&alice),
            Some(json!({ "recipientIds": [bob_id] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["usernames"], json!(["bob"]));

    // Recipient sees the note
    let (status, body) = app.request(Method::GET, "/api/timeline", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["id"], note_id);
    assert_eq!(body["items"][0]["sender"]["username"], "alice");
    assert_eq!(body["pageSize"], 10);

    let (status, _) = app
        .request(Method::GET, &format!("/api/notes/{}", note_id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_from_timeline() {
    let app = spawn_app().await;
    let (_, alice) = app.sign_up("alice").await;
    let (bob_id, bob) = app.sign_up("bob").await;
    let note_id = app.create_note(&alice, "Hike at nine").await;

    app.request(
        Method::POST,
        &format!("/api/notes/{}/share", note_id),
        Some(&alice),
        Some(json!({ "recipientIds": [bob_id] })),
    )
    .await;

    // One unknown id rejects the whole request.
    let (status, body) = app
        .request(
            Method::DELETE,
            "/api/timeline",
            Some(&bob),
            Some(json!({ "notesIds": [note_id, 777] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["notesIds"], json!([777]));

    let (_, body) = app.request(Method::GET, "/api/timeline", Some(&bob), None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .request(
            Method::DELETE,
            "/api/timeline",
            Some(&bob),
            Some(json!({ "notesIds": [note_id] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.request(Method::GET, "/api/timeline", Some(&bob), None).await;
    assert!(body["items"].as_array().unwrap().is_empty());

    // Removed notes are no longer readable by the recipient.
    let (status, _) = app
        .request(Method::GET, &format!("/api/notes/{}", note_id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_notes_pagination_bounds() {
    let app = spawn_app().await;
    let (_, alice) = app.sign_up("alice").await;
    app.create_note(&alice, "First").await;

    let (status, body) = app.request(Method::GET, "/api/notes", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pageSize"], 30);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .request(Method::GET, "/api/notes?pageSize=500", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
