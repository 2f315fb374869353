//! Development proxy: every request is rewritten through the [`PathRouter`]
//! and replayed against the backend origin with its own `Host`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use http_body_util::LengthLimitError;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config;
use crate::error::ProxyError;
use crate::router::PathRouter;

/// Health endpoint of the proxy itself, outside the `/api` root.
pub const HEALTH_PATH: &str = "/__proxy/health";

// Connection-scoped headers never forwarded in either direction
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::CONTENT_LENGTH,
];

#[derive(Clone)]
pub struct ProxyState {
    router: Arc<PathRouter>,
    client: reqwest::Client,
    timeout: Duration,
    max_body_bytes: usize,
}

impl ProxyState {
    pub fn new(router: Arc<PathRouter>, timeout: Duration, max_body_bytes: usize) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .no_gzip()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            router,
            client,
            timeout,
            max_body_bytes,
        })
    }

    pub fn from_config(router: Arc<PathRouter>) -> Result<Self, reqwest::Error> {
        let proxy = &config::config().proxy;
        Self::new(router, Duration::from_millis(proxy.timeout_ms), proxy.max_body_bytes)
    }
}

pub fn app(state: ProxyState, enable_cors: bool) -> Router {
    let app = Router::new()
        .route(HEALTH_PATH, get(health))
        .fallback(forward)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

pub async fn serve(listener: TcpListener, state: ProxyState, enable_cors: bool) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Dev proxy listening on http://{} ({} rules)", addr, state.router.rules().len());
    }
    axum::serve(listener, app(state, enable_cors)).await
}

async fn health(State(state): State<ProxyState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "rules": state.router.rules().len(),
            "timestamp": chrono::Utc::now(),
        }
    }))
}

async fn forward(State(state): State<ProxyState>, request: Request) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());

    let target = state
        .router
        .resolve(path_and_query)
        .ok_or_else(|| ProxyError::NoRoute(parts.uri.path().to_string()))?;
    let url = target.url();

    let body = to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| body_error(e, state.max_body_bytes))?;

    let upstream = state
        .client
        .request(parts.method.clone(), &url)
        .headers(forwardable(&parts.headers, true))
        .timeout(state.timeout)
        .body(body)
        .send()
        .await
        .map_err(|e| ProxyError::from_upstream(&url, e))?;

    tracing::debug!("{} {} -> {} [{}]", parts.method, path_and_query, url, upstream.status());

    let status = upstream.status();
    let headers = forwardable(upstream.headers(), false);
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| ProxyError::from_upstream(&url, e))?;

    let mut response = (status, Body::from(bytes)).into_response();
    response.headers_mut().extend(headers);
    Ok(response)
}

/// Only an exceeded limit is the client's payload size; anything else means
/// the body stream broke before it was fully read.
fn body_error(err: axum::Error, limit: usize) -> ProxyError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return ProxyError::PayloadTooLarge(limit);
        }
        source = e.source();
    }

    tracing::warn!("Failed to read request body: {}", err);
    ProxyError::BadRequest(format!("Failed to read request body: {}", err))
}

/// Copy headers minus hop-by-hop ones. Outbound requests also drop `Host`
/// so the client sets it from the target URL.
fn forwardable(headers: &HeaderMap, outbound: bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if HOP_BY_HOP.contains(name) || (outbound && *name == header::HOST) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
