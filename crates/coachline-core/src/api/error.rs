use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

/// Structured error body returned by the service.
///
/// `{}` when the body was empty or not JSON. A JSON body that is not an
/// object (an array, string or number) is kept under [`NON_OBJECT_BODY_KEY`].
pub type ErrorBody = Map<String, Value>;

/// Key holding an error body that decoded to something other than an object
pub const NON_OBJECT_BODY_KEY: &str = "body";

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("API error {status}: {}", describe_body(.body))]
    Api { status: StatusCode, body: ErrorBody },

    #[error("Invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request to {endpoint} timed out after {}s", .after.as_secs_f32())]
    Timeout { endpoint: String, after: Duration },

    #[error("Request to {endpoint} was cancelled")]
    Cancelled { endpoint: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a rendered body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

/// Human readable message carried by an error body, if any.
///
/// The service answers with `{"error": "..."}` for domain failures and
/// `{"detail": ...}` for validation failures.
fn body_message(body: &ErrorBody) -> Option<String> {
    for key in ["error", "detail", "message", NON_OBJECT_BODY_KEY] {
        match body.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Null) | None => {}
            Some(Value::String(_)) => {}
            Some(other) => return Some(truncate_body(&other.to_string())),
        }
    }
    None
}

fn describe_body(body: &ErrorBody) -> String {
    if let Some(message) = body_message(body) {
        return message;
    }
    if body.is_empty() {
        return "no details".to_string();
    }
    truncate_body(&Value::Object(body.clone()).to_string())
}

impl ApiError {
    /// Build an `Api` error from a failed response's status and raw body.
    ///
    /// A body that is not JSON (or is JSON `null`) degrades to an empty
    /// object so the failure is still reported in structured form.
    pub fn from_response(status: StatusCode, raw_body: &[u8]) -> Self {
        let body = match serde_json::from_slice::<Value>(raw_body) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) | Err(_) => ErrorBody::new(),
            Ok(other) => {
                let mut map = ErrorBody::new();
                map.insert(NON_OBJECT_BODY_KEY.to_string(), other);
                map
            }
        };
        ApiError::Api { status, body }
    }

    pub(crate) fn from_transport(err: reqwest::Error, endpoint: &str, after: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                endpoint: endpoint.to_string(),
                after,
            }
        } else {
            ApiError::Transport(err)
        }
    }

    /// Structured body of an `Api` error
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for showing to the user
    pub fn message(&self) -> String {
        match self {
            ApiError::Api { body, status } => body_message(body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            }),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
