#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{Form, Path, Request},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use vod_client::proxy::{self, ProxyState};
use vod_client::router::PathRouter;

pub const TEST_TOKEN: &str = "jwt test-token";

pub struct TestServer {
    pub addr: SocketAddr,
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn spawn(app: Router) -> Result<TestServer> {
    // Ephemeral port keeps parallel tests isolated
    let listener = TcpListener::bind("127.0.0.1:0").await.context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(TestServer {
        addr,
        base_url: format!("http://{}", addr),
        handle,
    })
}

/// Stand-in for the platform backend, speaking its `{code, message, data}` envelope.
pub async fn spawn_backend() -> Result<TestServer> {
    let app = Router::new()
        .route("/vod/vod_list", get(vod_list))
        .route("/auth/login", post(login))
        .route("/auth/user", get(current_user))
        .route("/publish/:vod_id", post(publish))
        .fallback(not_found);
    spawn(app).await
}

pub async fn spawn_proxy(backend_origin: &str) -> Result<TestServer> {
    let router = PathRouter::standard(backend_origin)?;
    let state = ProxyState::new(Arc::new(router), Duration::from_secs(5), 1024 * 1024)?;
    spawn(proxy::app(state, true)).await
}

/// Fresh storage directory, removed when the returned guard is dropped.
pub fn scratch_dir(name: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(&format!("vod_client_test_{}_", name))
        .tempdir()
        .context("failed to create scratch dir")
}

async fn vod_list(request: Request) -> Json<Value> {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({
        "code": 200,
        "message": "ok",
        "data": {
            "path": request.uri().path(),
            "query": request.uri().query().unwrap_or_default(),
            "host": host,
        }
    }))
}

async fn login(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    let username = form.get("username").map(String::as_str);
    let password = form.get("password").map(String::as_str);

    if username == Some("neo") && password == Some("secret") {
        Json(json!({
            "code": 200,
            "message": "Login successfully",
            "data": { "token": TEST_TOKEN, "user_id": 7, "username": "neo", "role": "user" }
        }))
    } else {
        Json(json!({ "code": 400, "message": "登录失败, 账户或密码不正确", "data": null }))
    }
}

async fn current_user(headers: HeaderMap) -> impl IntoResponse {
    let expected = format!("Bearer {}", TEST_TOKEN);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => (
            StatusCode::OK,
            Json(json!({
                "code": 200,
                "message": "ok",
                "data": { "id": 7, "name": "neo", "username": "neo", "role": "admin" }
            })),
        ),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Not authenticated" }))),
    }
}

async fn publish(Path(vod_id): Path<i64>, Json(body): Json<Value>) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({ "code": 200, "message": "published", "data": { "vod_id": vod_id, "body": body } })),
    )
}

async fn not_found(request: Request) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Not Found", "path": request.uri().path() })),
    )
}
