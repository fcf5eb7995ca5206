//! Transport-level errors from the proxy API

use serde::Deserialize;

/// The `detail` field of an error body: either a plain string or an object
/// carrying a human-readable `error`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Structured {
        error: String,
        #[serde(default)]
        error_type: Option<String>,
    },
    Other(serde_json::Value),
}

/// Error response body
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}")]
    Status {
        status: u16,
        detail: Option<ErrorDetail>,
    },
    #[error("network error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error from a raw response body
    pub(crate) fn from_body(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail);
        Self::Status { status, detail }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Network failures and server-side 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }

    /// Human-readable reason from the server, if it sent one
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Status {
                detail: Some(ErrorDetail::Structured { error, .. }),
                ..
            } => Some(error.clone()),
            Self::Status {
                detail: Some(ErrorDetail::Message(message)),
                ..
            } if !message.is_empty() => Some(message.clone()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail() {
        let err = ApiError::from_body(400, br#"{"detail":"Incorrect username or password"}"#);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.reason().as_deref(), Some("Incorrect username or password"));
    }

    #[test]
    fn test_structured_detail() {
        let body = br#"{"detail":{"error":"Daily limit reached","error_type":"daily_limit","daily_limit":100}}"#;
        let err = ApiError::from_body(429, body);
        assert_eq!(err.reason().as_deref(), Some("Daily limit reached"));
        assert!(matches!(
            err,
            ApiError::Status {
                detail: Some(ErrorDetail::Structured { ref error_type, .. }),
                ..
            } if error_type.as_deref() == Some("daily_limit")
        ));
    }

    #[test]
    fn test_unparseable_body_has_no_reason() {
        let err = ApiError::from_body(502, b"<html>Bad Gateway</html>");
        assert_eq!(err.reason(), None);
        assert!(err.is_transient());
    }

    #[test]
    fn test_validation_list_detail_is_not_a_reason() {
        let err = ApiError::from_body(422, br#"{"detail":[{"loc":["body","message"],"msg":"field required"}]}"#);
        assert!(matches!(
            err,
            ApiError::Status {
                detail: Some(ErrorDetail::Other(_)),
                ..
            }
        ));
        assert_eq!(err.reason(), None);
        assert!(!err.is_transient());
    }
}
