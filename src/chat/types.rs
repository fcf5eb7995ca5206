//! Conversation data types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::api::{ChatResponse, MessageRecord, Role};
use crate::models::AttachmentKind;

/// Message identity. Local ids only exist for optimistic entries and can
/// never compare equal to a server id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum MessageId {
    Server(i64),
    Local(Uuid),
}

impl MessageId {
    pub fn local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => write!(f, "{}", id),
            Self::Local(id) => write!(f, "local-{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    /// Model that produced (or was asked for) this message
    pub model: Option<String>,
    pub tokens_used: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Optimistic user entry, shown before the server answers
    pub(crate) fn optimistic(content: &str) -> Self {
        Self {
            id: MessageId::local(),
            role: Role::User,
            content: content.to_string(),
            model: None,
            tokens_used: None,
            created_at: Utc::now(),
        }
    }

    /// Assistant entry built from a send response
    pub(crate) fn from_reply(response: &ChatResponse, requested_model: &str) -> Self {
        let reply = response.assistant_message.as_ref();
        Self {
            id: reply
                .and_then(|r| r.id)
                .map_or_else(MessageId::local, MessageId::Server),
            role: Role::Assistant,
            content: reply
                .map(|r| r.content.clone())
                .or_else(|| response.response.clone())
                .unwrap_or_default(),
            model: Some(
                reply
                    .and_then(|r| r.model_used.clone())
                    .unwrap_or_else(|| requested_model.to_string()),
            ),
            tokens_used: reply.and_then(|r| r.tokens_used).or(response.tokens_used),
            created_at: Utc::now(),
        }
    }
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: MessageId::Server(record.id),
            role: record.role,
            content: record.content,
            model: record.model_used,
            tokens_used: record.tokens_used,
            created_at: record.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Server-side file reference attached to a send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub file_id: String,
    pub kind: AttachmentKind,
}

/// Snapshot of the live conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    /// `None` until the first successful send creates the conversation
    pub conversation_id: Option<i64>,
    pub title: Option<String>,
    pub messages: Vec<Message>,
    pub selected_model: String,
    pub is_sending: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_coins_spent: Option<i64>,
}

impl ConversationState {
    pub fn new(model: &str) -> Self {
        Self {
            conversation_id: None,
            title: None,
            messages: Vec::new(),
            selected_model: model.to_string(),
            is_sending: false,
            is_loading: false,
            error: None,
            last_coins_spent: None,
        }
    }

    /// Back to a fresh conversation; the model selection is kept
    pub(crate) fn reset(&mut self) {
        self.conversation_id = None;
        self.title = None;
        self.messages.clear();
        self.error = None;
        self.last_coins_spent = None;
    }
}

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq)]
pub struct SendReceipt {
    pub conversation_id: i64,
    pub coins_spent: Option<i64>,
    pub balance_remaining: Option<i64>,
    pub tokens_used: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AssistantReply;

    #[test]
    fn test_local_ids_never_equal_server_ids() {
        let local = MessageId::local();
        assert!(local.is_local());
        assert_ne!(local, MessageId::Server(1));
        assert_ne!(MessageId::local(), MessageId::local());
        assert_eq!(MessageId::Server(7).to_string(), "7");
    }

    #[test]
    fn test_reply_falls_back_to_flat_response() {
        let response = ChatResponse {
            conversation_id: 3,
            assistant_message: None,
            response: Some("flat".into()),
            tokens_used: Some(9),
            coins_spent: Some(1),
            balance_remaining: Some(99),
        };
        let message = Message::from_reply(&response, "openai/gpt-4o");
        assert_eq!(message.content, "flat");
        assert_eq!(message.tokens_used, Some(9));
        assert_eq!(message.model.as_deref(), Some("openai/gpt-4o"));
        assert!(message.id.is_local());
    }

    #[test]
    fn test_reply_uses_server_id_and_model() {
        let response = ChatResponse {
            conversation_id: 3,
            assistant_message: Some(AssistantReply {
                id: Some(12),
                content: "hi".into(),
                tokens_used: Some(4),
                model_used: Some("anthropic/claude-sonnet-4".into()),
            }),
            response: None,
            tokens_used: None,
            coins_spent: None,
            balance_remaining: None,
        };
        let message = Message::from_reply(&response, "openai/gpt-4o");
        assert_eq!(message.id, MessageId::Server(12));
        assert_eq!(message.model.as_deref(), Some("anthropic/claude-sonnet-4"));
    }
}
