//! Wire types for the proxy API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::AttachmentKind;

/// User profile as returned by `/auth/me` and the auth endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Spendable coins, as computed by the server
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub subscription_plan: Option<String>,
    #[serde(default, with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial update merged into the live [`User`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub balance: Option<i64>,
    pub email: Option<Option<String>>,
    pub subscription_plan: Option<String>,
}

impl UserPatch {
    pub fn balance(balance: i64) -> Self {
        Self {
            balance: Some(balance),
            ..Default::default()
        }
    }
}

impl User {
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(balance) = patch.balance {
            self.balance = balance;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(plan) = patch.subscription_plan {
            self.subscription_plan = Some(plan);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Acquisition attribution, passed through to the backend untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct Attribution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub attribution: Attribution,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Stored message as returned inside a conversation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub role: Role,
    pub content: String,
    #[serde(default, alias = "model")]
    pub model_used: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<i64>,
    #[serde(default, with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `POST /chat/send` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessageRequest {
    pub message: String,
    /// The backend reads the model from `ai_model`
    pub ai_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<AttachmentKind>,
}

/// Assistant part of a send response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub id: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub tokens_used: Option<i64>,
    #[serde(default, alias = "model")]
    pub model_used: Option<String>,
}

/// `POST /chat/send` response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: i64,
    #[serde(default)]
    pub assistant_message: Option<AssistantReply>,
    /// Older backends return the reply text flat
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<i64>,
    #[serde(default)]
    pub coins_spent: Option<i64>,
    #[serde(default)]
    pub balance_remaining: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub ai_model: Option<String>,
    #[serde(default, alias = "messages_count")]
    pub message_count: i64,
    #[serde(default, with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Single conversation with embedded messages
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversationRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub ai_model: Option<String>,
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
}

/// Result of `POST /files/upload`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedFile {
    pub file_id: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
}

/// Raw file handed to the upload endpoint
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelPrice {
    pub model_id: String,
    #[serde(default)]
    pub price_per_1m_tokens: i64,
    #[serde(default)]
    pub input_per_1m: Option<i64>,
    #[serde(default)]
    pub output_per_1m: Option<i64>,
}

/// `GET /chat/models/available` response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AvailableModels {
    #[serde(default)]
    pub balance: Option<i64>,
    #[serde(default)]
    pub models: Vec<ModelPrice>,
}

/// Server timestamps come either as RFC 3339 or as naive UTC
/// (`2025-01-01T12:00:00.123456`)
mod lenient_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
