#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use hotel_api::auth::password::hash_password;
use hotel_api::auth::session::ClientInfo;
use hotel_api::auth::verification::CodeSender;
use hotel_api::config::ServerConfig;
use hotel_api::router::build_app_router;
use hotel_api::state::AppState;
use hotel_core::error::CoreError;
use hotel_core::patch::PatchMode;
use hotel_core::policy::PolicyEngine;
use hotel_core::roles::STATUS_ACTIVE;
use hotel_db::models::user::{CreateUser, User};
use hotel_db::repositories::Repositories;

/// Password given to every seeded user.
pub const PASSWORD: &str = "correct-horse-battery";

/// Policy used by the integration tests. Mirrors `config/policy.csv`.
pub const TEST_POLICY: &str = "\
p, admin, /v1/*, *
p, *, /v1/auth/logout, POST
p, staff, /v1/room/*, GET|POST|PUT|DELETE
p, staff, /v1/room-review/*, GET|POST|PUT|DELETE
p, staff, /v1/user/{id}, DELETE, deny
p, staff, /v1/user/*, GET
p, staff, /v1/session/*, GET
p, guest, /v1/user/{id}, DELETE, deny
p, guest, /v1/room/*, GET
p, guest, /v1/room-review/*, GET
p, guest, /v1/room-review, POST
";

/// Captures verification codes instead of sending them. Can be switched to
/// fail every delivery.
#[derive(Default)]
pub struct CapturedCodes {
    sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

#[async_trait]
impl CodeSender for CapturedCodes {
    async fn send(&self, email: &str, code: &str) -> Result<(), CoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::Internal("mail relay unreachable".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}

impl CapturedCodes {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, c)| c.clone())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub codes: Arc<CapturedCodes>,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    }
}

/// Build the full application over in-memory storage.
///
/// Uses the same router builder as `main.rs`, so tests exercise the real
/// middleware stack including the auth gate.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let repos = Repositories::in_memory(config.patch_mode);
    let policy = PolicyEngine::from_csv(TEST_POLICY).unwrap();
    let codes = Arc::new(CapturedCodes::default());
    let state = AppState::new(config, None, repos, policy, codes.clone());
    TestApp {
        router: build_app_router(state.clone()),
        state,
        codes,
    }
}

pub fn explicit_patch_config() -> ServerConfig {
    ServerConfig {
        patch_mode: PatchMode::Explicit,
        ..test_config()
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Insert an active user with `role` directly through the repository.
pub async fn seed_user(app: &TestApp, username: &str, role: &str) -> User {
    app.state
        .repos
        .users
        .create(&CreateUser {
            full_name: format!("{username} test"),
            username: username.to_string(),
            email: format!("{username}@hotel.test"),
            phone: String::new(),
            password_hash: hash_password(PASSWORD).unwrap(),
            user_type: "staff".to_string(),
            role: role.to_string(),
            status: STATUS_ACTIVE.to_string(),
            gender: String::new(),
        })
        .await
        .unwrap()
}

/// Seed a user with `role` and open a session for it, returning the bearer
/// token.
pub async fn token_for(app: &TestApp, username: &str, role: &str) -> (User, String) {
    let user = seed_user(app, username, role).await;
    let issued = app
        .state
        .sessions
        .create(user.id, &user.role, ClientInfo::default())
        .await
        .unwrap();
    (user, issued.token)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: &TestApp,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: &TestApp,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Read the response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and error code of a JSON error response.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code, "unexpected error body: {json}");
}
