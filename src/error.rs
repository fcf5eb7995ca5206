//! Error taxonomy for the chat client
//!
//! Remote failures arrive as [`ApiError`] and are normalised here into a
//! [`ChatError`] whose `Display` text is what the UI shows. Local pre-flight
//! refusals (capability, budget gate, empty message) never reach the network.

use crate::api::ApiError;
use crate::billing::BudgetDenialReason;
use crate::models::AttachmentKind;

const GENERIC_SEND_FAILURE: &str = "Failed to send message";
const GENERIC_READ_FAILURE: &str = "Request failed";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatError {
    /// Invalid credentials on login/register, with the server's reason
    #[error("{0}")]
    Auth(String),
    /// Missing token, or a token the backend rejected
    #[error("Not signed in or session expired")]
    Unauthorized,
    /// Network or 5xx failure on a read; the session is kept
    #[error("Couldn't refresh: {0}")]
    Transient(String),
    /// The backend rejected a send
    #[error("{0}")]
    Send(String),
    #[error("{model} does not accept {kind} attachments")]
    Capability { model: String, kind: AttachmentKind },
    #[error("{0}")]
    BudgetBlocked(BudgetDenialReason),
    #[error("Conversation not found")]
    NotFound,
    #[error("Access to this conversation is forbidden")]
    Forbidden,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("A message is already being sent")]
    SendInFlight,
    #[error("Superseded by a newer conversation selection")]
    Superseded,
    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),
    /// Any other remote rejection (budget settings, uploads, deletes)
    #[error("{0}")]
    Rejected(String),
    #[error("Token storage error: {0}")]
    Storage(String),
}

impl ChatError {
    /// Normalise a login/register failure
    pub(crate) fn from_auth(err: ApiError, fallback: &str) -> Self {
        if err.is_transient() {
            return Self::Transient(err.to_string());
        }
        Self::Auth(err.reason().unwrap_or_else(|| fallback.to_string()))
    }

    /// Normalise a failure of an authenticated read or settings write
    pub(crate) fn from_read(err: ApiError) -> Self {
        match err.status() {
            Some(401) => Self::Unauthorized,
            Some(403) => Self::Forbidden,
            Some(404) => Self::NotFound,
            _ if err.is_transient() => Self::Transient(err.to_string()),
            _ => Self::Rejected(
                err.reason()
                    .unwrap_or_else(|| GENERIC_READ_FAILURE.to_string()),
            ),
        }
    }

    /// Normalise a failed send: structured `error`, then string `detail`,
    /// then a generic message
    pub(crate) fn from_send(err: ApiError) -> Self {
        Self::Send(
            err.reason()
                .unwrap_or_else(|| GENERIC_SEND_FAILURE.to_string()),
        )
    }

    /// True for refusals decided locally, before any request was made
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::Capability { .. }
                | Self::BudgetBlocked(_)
                | Self::EmptyMessage
                | Self::SendInFlight
                | Self::InvalidAttachment(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorDetail;

    fn status(code: u16, detail: Option<ErrorDetail>) -> ApiError {
        ApiError::Status {
            status: code,
            detail,
        }
    }

    #[test]
    fn test_send_prefers_structured_error() {
        let err = status(
            402,
            Some(ErrorDetail::Structured {
                error: "Not enough coins".to_string(),
                error_type: Some("no_balance".to_string()),
            }),
        );
        assert_eq!(
            ChatError::from_send(err),
            ChatError::Send("Not enough coins".to_string())
        );
    }

    #[test]
    fn test_send_falls_back_to_string_detail_then_generic() {
        let err = status(400, Some(ErrorDetail::Message("Model unavailable".into())));
        assert_eq!(ChatError::from_send(err).to_string(), "Model unavailable");

        let err = ApiError::Transport("connection reset".into());
        assert_eq!(ChatError::from_send(err).to_string(), GENERIC_SEND_FAILURE);
    }

    #[test]
    fn test_read_status_mapping() {
        assert_eq!(ChatError::from_read(status(401, None)), ChatError::Unauthorized);
        assert_eq!(ChatError::from_read(status(403, None)), ChatError::Forbidden);
        assert_eq!(ChatError::from_read(status(404, None)), ChatError::NotFound);
        assert!(matches!(
            ChatError::from_read(status(503, None)),
            ChatError::Transient(_)
        ));
        assert_eq!(
            ChatError::from_read(status(400, Some(ErrorDetail::Message("bad".into())))),
            ChatError::Rejected("bad".into())
        );
    }

    #[test]
    fn test_auth_uses_server_reason() {
        let err = status(401, Some(ErrorDetail::Message("Wrong password".into())));
        assert_eq!(
            ChatError::from_auth(err, "Login failed"),
            ChatError::Auth("Wrong password".into())
        );
        assert_eq!(
            ChatError::from_auth(status(422, None), "Login failed"),
            ChatError::Auth("Login failed".into())
        );
    }

    #[test]
    fn test_preflight_classification() {
        assert!(ChatError::EmptyMessage.is_preflight());
        assert!(!ChatError::Send("x".into()).is_preflight());
        assert!(!ChatError::Unauthorized.is_preflight());
    }
}
