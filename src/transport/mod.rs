//! HTTP transport used by every API call.
//!
//! Callers address the client-visible API (`/auth/login`, `/vod_list`, ...).
//! The transport prefixes the `/api` root and either resolves the result
//! through a [`PathRouter`] and calls the backend directly, or hands it to a
//! running dev proxy that does the resolution.

mod request;

pub use request::{ApiRequest, Body, Envelope, Method, TransportResponse};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config;
use crate::router::{PathRouter, RouterError, ROOT_PREFIX};
use crate::storage::{DurableStorage, TOKEN_KEY};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("No backend route for '{0}'")]
    NoRoute(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request rejected (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Router(#[from] RouterError),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Clone)]
enum Target {
    Router(Arc<PathRouter>),
    Proxy(String),
}

pub struct HttpTransport {
    client: reqwest::Client,
    target: Target,
    token_source: Option<Arc<dyn DurableStorage>>,
    default_timeout: Duration,
}

impl HttpTransport {
    /// Resolve paths locally and call the backend origin directly.
    pub fn direct(router: Arc<PathRouter>) -> Self {
        Self::with_target(Target::Router(router))
    }

    /// Send everything to a dev proxy at `base_url`.
    pub fn via_proxy(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self::with_target(Target::Proxy(base_url.trim_end_matches('/').to_string()))
    }

    pub fn from_config() -> Result<Self, TransportError> {
        match &config::config().client.transport_base_url {
            Some(base_url) => Ok(Self::via_proxy(base_url.clone())),
            None => Ok(Self::direct(Arc::new(PathRouter::from_config()?))),
        }
    }

    fn with_target(target: Target) -> Self {
        Self {
            client: reqwest::Client::new(),
            target,
            token_source: None,
            default_timeout: Duration::from_millis(config::config().client.timeout_ms),
        }
    }

    /// Read the session token from `storage` before every request, the way
    /// a browser interceptor reads local storage.
    pub fn with_token_source(mut self, storage: Arc<dyn DurableStorage>) -> Self {
        self.token_source = Some(storage);
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    fn url_for(&self, path: &str) -> Result<String, TransportError> {
        let client_path = format!("{}{}", ROOT_PREFIX, path);
        match &self.target {
            Target::Router(router) => router
                .resolve(&client_path)
                .map(|resolved| resolved.url())
                .ok_or(TransportError::NoRoute(client_path)),
            Target::Proxy(base_url) => Ok(format!("{}{}", base_url, client_path)),
        }
    }

    fn token(&self) -> Option<String> {
        let storage = self.token_source.as_ref()?;
        match storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Could not read session token: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        let timeout = request
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);

        tracing::debug!("{:?} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.into(), &url)
            .query(&request.params)
            .timeout(timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if !request.has_header("authorization") {
            if let Some(token) = self.token() {
                builder = builder.bearer_auth(token);
            }
        }

        builder = match &request.body {
            Some(Body::Json(value)) => builder.json(value),
            Some(Body::Form(fields)) => builder.form(fields),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(TransportResponse { status, body })
    }
}
