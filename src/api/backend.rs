//! The seam between the client core and the remote proxy API

use async_trait::async_trait;

use super::error::ApiError;
use super::types::{
    AuthResponse, AvailableModels, ChatResponse, ConversationRecord, ConversationSummary,
    FileUpload, LoginRequest, RegisterRequest, SendMessageRequest, UploadedFile, User,
};
use crate::billing::{BudgetSettings, BudgetSnapshot};

/// Remote operations the client consumes. Implementations must not retry
/// `send_message`: a retried send spends coins twice.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;

    async fn current_user(&self, token: &str) -> Result<User, ApiError>;

    async fn send_message(
        &self,
        token: &str,
        request: &SendMessageRequest,
    ) -> Result<ChatResponse, ApiError>;

    async fn list_conversations(&self, token: &str) -> Result<Vec<ConversationSummary>, ApiError>;

    async fn get_conversation(&self, token: &str, id: i64) -> Result<ConversationRecord, ApiError>;

    async fn delete_conversation(&self, token: &str, id: i64) -> Result<(), ApiError>;

    async fn get_budget(&self, token: &str) -> Result<BudgetSnapshot, ApiError>;

    async fn set_budget(
        &self,
        token: &str,
        settings: &BudgetSettings,
    ) -> Result<BudgetSnapshot, ApiError>;

    async fn disable_budget(&self, token: &str) -> Result<(), ApiError>;

    async fn upload_file(&self, token: &str, file: FileUpload) -> Result<UploadedFile, ApiError>;

    async fn available_models(&self, token: &str) -> Result<AvailableModels, ApiError>;
}
