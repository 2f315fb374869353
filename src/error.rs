// Dev proxy HTTP error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// Errors the dev proxy answers with instead of an upstream response
#[derive(Debug)]
pub enum ProxyError {
    // 400 Bad Request (request body could not be read)
    BadRequest(String),

    // 404 Not Found (no rewrite rule matches)
    NoRoute(String),

    // 413 Payload Too Large
    PayloadTooLarge(usize),

    // 502 Bad Gateway (backend unreachable or broken reply)
    BadGateway(String),

    // 504 Gateway Timeout
    GatewayTimeout(String),
}

impl ProxyError {
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::BadRequest(_) => 400,
            ProxyError::NoRoute(_) => 404,
            ProxyError::PayloadTooLarge(_) => 413,
            ProxyError::BadGateway(_) => 502,
            ProxyError::GatewayTimeout(_) => 504,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ProxyError::BadRequest(msg) => msg.clone(),
            ProxyError::NoRoute(path) => format!("No proxy rule matches '{}'", path),
            ProxyError::PayloadTooLarge(limit) => format!("Request body exceeds {} bytes", limit),
            ProxyError::BadGateway(msg) => msg.clone(),
            ProxyError::GatewayTimeout(url) => format!("Backend did not answer in time: {}", url),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ProxyError::BadRequest(_) => "BAD_REQUEST",
            ProxyError::NoRoute(_) => "NO_ROUTE",
            ProxyError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ProxyError::BadGateway(_) => "BAD_GATEWAY",
            ProxyError::GatewayTimeout(_) => "GATEWAY_TIMEOUT",
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "error_code": self.error_code()
        })
    }

    /// Classify a failed upstream call
    pub fn from_upstream(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            tracing::error!("Upstream timeout: {}", url);
            ProxyError::GatewayTimeout(url.to_string())
        } else {
            tracing::error!("Upstream error for {}: {}", url, err);
            ProxyError::BadGateway(format!("Backend request failed: {}", url))
        }
    }
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ProxyError {}

impl IntoResponse for ProxyError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(self.to_json())).into_response()
    }
}
