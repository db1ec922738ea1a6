use std::fmt;

use serde_json::Value;

/// Failure classification for one logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The refresh token was absent or the refresh call failed. The persisted
    /// session has already been cleared; the caller should return to login.
    SessionExpired,

    /// Any non-2xx response not recovered by the refresh protocol.
    HttpStatus { status: u16, message: String },

    /// Client-side gating rejected the action before any network call.
    ValidationRejected { reason: String },

    /// Transport-level failure (timeout, connection refused, ...).
    Network { message: String },

    /// The response body could not be decoded into the expected shape.
    Decode { message: String },
}

impl ApiError {
    /// Builds an HTTP status error, lifting the backend's `detail` field out
    /// of JSON error bodies when present.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| {
                json.get("detail")
                    .and_then(|d| d.as_str())
                    .map(|d| format!("HTTP {status}: {d}"))
            })
            .unwrap_or_else(|| format!("HTTP {status}"));
        ApiError::HttpStatus { status, message }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        ApiError::ValidationRejected {
            reason: reason.into(),
        }
    }

    pub fn decode(message: impl fmt::Display) -> Self {
        ApiError::Decode {
            message: message.to_string(),
        }
    }

    /// Classifies a transport error from reqwest.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            format!("network error: {e}")
        };
        ApiError::Network { message }
    }

    /// HTTP status code, when this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::SessionExpired => f.write_str("session expired"),
            ApiError::HttpStatus { message, .. } => f.write_str(message),
            ApiError::ValidationRejected { reason } => write!(f, "rejected: {reason}"),
            ApiError::Network { message } | ApiError::Decode { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for ApiError {}
