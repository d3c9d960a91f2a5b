use std::sync::Arc;

use api::{router, AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use proxlib_core::ServerConfig;
use serde_json::{json, Value};
use storage::{Credential, CredentialStore, MemoryCredentialStore, StoreError, Table, UserSummary};
use tower::ServiceExt;

const SECRET: &str = "integration_secret";

struct TestApp {
    router: Router,
    state: Arc<AppState>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_store(Arc::new(MemoryCredentialStore::new()))
    }

    fn with_store(store: Arc<dyn CredentialStore>) -> Self {
        let state = Arc::new(AppState::from_store(store, SECRET.to_string(), 3600));
        Self {
            router: router::router(state.clone()),
            state,
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(&self, name: &str, password: &str) -> (StatusCode, Value) {
        self.send(Method::POST, "/auth/register", None, Some(json!({ "name": name, "password": password })))
            .await
    }

    async fn admin_token(&self) -> String {
        self.state.auth_service.create_admin("root", "hunter22").await.unwrap();
        let (status, body) = self
            .send(Method::POST, "/admin/login", None, Some(json!({ "name": "root", "password": "hunter22" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }
}

/// In-memory store whose users can never be deleted because another table
/// references them without cascading
struct ReferencedUsersStore(MemoryCredentialStore);

#[async_trait]
impl CredentialStore for ReferencedUsersStore {
    async fn insert_credential(&self, table: Table, name: &str, password_hash: &str) -> storage::Result<i32> {
        self.0.insert_credential(table, name, password_hash).await
    }

    async fn find_credential(&self, table: Table, name: &str) -> storage::Result<Option<Credential>> {
        self.0.find_credential(table, name).await
    }

    async fn count_credentials(&self, table: Table) -> storage::Result<i64> {
        self.0.count_credentials(table).await
    }

    async fn list_users(&self) -> storage::Result<Vec<UserSummary>> {
        self.0.list_users().await
    }

    async fn update_rating(&self, id: i32, rating: f64) -> storage::Result<Option<UserSummary>> {
        self.0.update_rating(id, rating).await
    }

    async fn delete_user(&self, _id: i32) -> storage::Result<bool> {
        Err(StoreError::ForeignKeyViolation("loans_user_id_fkey".to_string()))
    }
}

#[tokio::test]
async fn test_register_login_end_to_end() {
    let app = TestApp::new();

    let (status, body) = app.register("alice", "secret123").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered");
    let userid = body["userid"].as_i64().unwrap();
    assert!(body.get("password").is_none());

    let (status, body) = app
        .send(Method::POST, "/auth/login", None, Some(json!({ "name": "alice", "password": "secret123" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userid"].as_i64().unwrap(), userid);
    let token = body["token"].as_str().unwrap();
    let claims = app.state.auth_service.verify(token).unwrap();
    assert_eq!(claims.name, "alice");

    let (status, body) = app
        .send(Method::POST, "/auth/login", None, Some(json!({ "name": "alice", "password": "wrong" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_register_duplicate_is_conflict() {
    let app = TestApp::new();

    app.register("alice", "secret123").await;
    let (status, body) = app.register("alice", "secret123").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User with this name already exists");
}

#[tokio::test]
async fn test_missing_fields_are_bad_request() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Method::POST, "/auth/register", None, Some(json!({ "name": "alice" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name and password required");

    let (status, _) = app
        .send(Method::POST, "/admin/login", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_look_the_same() {
    let app = TestApp::new();
    app.register("alice", "secret123").await;

    let (_, unknown) = app
        .send(Method::POST, "/auth/login", None, Some(json!({ "name": "mallory", "password": "x" })))
        .await;
    let (_, wrong) = app
        .send(Method::POST, "/auth/login", None, Some(json!({ "name": "alice", "password": "x" })))
        .await;

    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn test_admin_login_failure() {
    let app = TestApp::new();
    app.state.auth_service.create_admin("root", "hunter22").await.unwrap();

    let (status, body) = app
        .send(Method::POST, "/admin/login", None, Some(json!({ "name": "root", "password": "nope" })))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid admin credentials");
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing or invalid Authorization header");

    let (status, _) = app.send(Method::GET, "/admin/users", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::DELETE, "/admin/users/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_token_is_forbidden_on_admin_routes() {
    let app = TestApp::new();
    app.register("alice", "secret123").await;
    let (_, body) = app
        .send(Method::POST, "/auth/login", None, Some(json!({ "name": "alice", "password": "secret123" })))
        .await;
    let token = body["token"].as_str().unwrap();

    let (status, _) = app.send(Method::GET, "/admin/users", Some(token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_expired_admin_token_rejected() {
    let app = TestApp::new();
    let token = auth::generate_token(1, "root", auth::Role::Admin, SECRET, -10).unwrap();

    let (status, body) = app.send(Method::GET, "/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token expired");
}

#[tokio::test]
async fn test_admin_lists_and_rates_users() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let (_, alice) = app.register("alice", "secret123").await;
    app.register("bob", "secret456").await;
    let alice_id = alice["userid"].as_i64().unwrap();

    let (status, body) = app.send(Method::GET, "/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["name"], "alice");
    assert_eq!(users[0]["rating"], 0.0);

    let uri = format!("/admin/users/{alice_id}/rating");
    let (status, body) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "newRating": 4.567 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["rating"], 4.57);
    assert_eq!(body["user"]["id"].as_i64().unwrap(), alice_id);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "newRating": -1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Rating must be a non-negative number");

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "newRating": "high" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::PUT, "/admin/users/999/rating", Some(&token), Some(json!({ "newRating": 1 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::PUT, "/admin/users/abc/rating", Some(&token), Some(json!({ "newRating": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_deletes_user() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let (_, alice) = app.register("alice", "secret123").await;
    let alice_id = alice["userid"].as_i64().unwrap();

    let uri = format!("/admin/users/{alice_id}");
    let (status, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("User {alice_id} deleted"));

    let (_, body) = app.send(Method::GET, "/admin/users", Some(&token), None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_delete_referenced_user_is_conflict() {
    let app = TestApp::with_store(Arc::new(ReferencedUsersStore(MemoryCredentialStore::new())));
    let token = app.admin_token().await;
    let (_, alice) = app.register("alice", "secret123").await;
    let alice_id = alice["userid"].as_i64().unwrap();

    let (status, body) = app
        .send(Method::DELETE, &format!("/admin/users/{alice_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User has dependent records and cannot be deleted");

    let (_, body) = app.send(Method::GET, "/admin/users", Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_static_fallback_serves_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>proxlib</html>").unwrap();

    let store = Arc::new(MemoryCredentialStore::new());
    let state = Arc::new(AppState::from_store(store, SECRET.to_string(), 3600));
    let server = ServerConfig {
        static_dir: Some(dir.path().to_path_buf()),
        cors_origin: Some("https://geolib.onrender.com".to_string()),
        ..ServerConfig::default()
    };
    let app = router::app(state, &server).unwrap();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/dashboard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<html>proxlib</html>");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/admindash/users").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
