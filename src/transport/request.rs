use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    /// Sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

/// A call against the client-visible API, path relative to `/api`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Body>,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout_ms: Option<u64>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            params: Vec::new(),
            headers: Vec::new(),
            timeout_ms: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    pub fn form<K: Into<String>, V: Into<String>>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.body = Some(Body::Form(fields));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

/// Raw reply. Non-JSON bodies are kept as a JSON string, empty bodies as null.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

/// The `{ code, message, data }` wrapper every backend reply uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Unwrap the envelope, turning HTTP errors and non-200 codes into errors.
    pub fn into_envelope(self) -> Result<Envelope, TransportError> {
        if !self.is_success() {
            return Err(TransportError::Status {
                status: self.status,
                message: error_message(&self.body),
            });
        }

        let envelope: Envelope =
            serde_json::from_value(self.body).map_err(|e| TransportError::Decode(e.to_string()))?;

        if envelope.code != 200 {
            return Err(TransportError::Rejected {
                code: envelope.code,
                message: envelope.message,
            });
        }

        Ok(envelope)
    }
}

fn error_message(body: &Value) -> String {
    ["message", "detail", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| body.as_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_parts() {
        let req = ApiRequest::get("/vod_list")
            .param("page", 2)
            .param("type_id", 1)
            .header("X-Trace", "t1")
            .timeout_ms(500);

        assert_eq!(req.method, Method::Get);
        assert_eq!(req.params, vec![("page".to_string(), "2".to_string()), ("type_id".to_string(), "1".to_string())]);
        assert!(req.has_header("x-trace"));
        assert_eq!(req.timeout_ms, Some(500));
    }

    #[test]
    fn envelope_code_other_than_200_is_rejected() {
        let response = TransportResponse {
            status: 200,
            body: json!({"code": 400, "message": "bad credentials", "data": null}),
        };
        match response.into_envelope() {
            Err(TransportError::Rejected { code, message }) => {
                assert_eq!(code, 400);
                assert_eq!(message, "bad credentials");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn http_error_carries_detail() {
        let response = TransportResponse {
            status: 401,
            body: json!({"detail": "Not authenticated"}),
        };
        match response.into_envelope() {
            Err(TransportError::Status { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Not authenticated");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn envelope_without_data_defaults_to_null() {
        let response = TransportResponse {
            status: 200,
            body: json!({"code": 200, "message": "ok"}),
        };
        let envelope = response.into_envelope().unwrap();
        assert!(envelope.data.is_null());
    }
}
