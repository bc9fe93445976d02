//! API client error types with server message unwrapping.

use serde_json::Value;

/// Message used when the server gives no usable `message` or `error`.
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Errors from calls against the risk-assessment API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response. `message` is the server's own wording.
    #[error("{message}")]
    Server { status: u16, message: String },
    /// Connection refused, DNS failure, broken stream, ...
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// 2xx response whose body does not match the expected shape.
    #[error("Invalid response from server: {0}")]
    Decode(String),
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Build a server error from a raw response body.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        ApiError::Server {
            status,
            message: server_message(body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// 401 — the (possibly stale) token was rejected.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// `data.message ?? data.error ?? "Request failed"`.
///
/// Empty strings fall through to the next candidate; a body that is not a
/// JSON object yields the fallback.
pub fn server_message(body: &[u8]) -> String {
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
        return FALLBACK_MESSAGE.to_string();
    };
    ["message", "error"]
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null | Value::Bool(false) | Value::String(_) => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}
