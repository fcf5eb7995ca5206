//! reqwest implementation of [`ChatBackend`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::backend::ChatBackend;
use super::error::ApiError;
use super::http_client::client_with_timeout;
use super::types::{
    AuthResponse, AvailableModels, ChatResponse, ConversationRecord, ConversationSummary,
    FileUpload, LoginRequest, RegisterRequest, SendMessageRequest, UploadedFile, User,
};
use crate::billing::{BudgetSettings, BudgetSnapshot};
use crate::config::ClientConfig;

/// Base delay between attempts of an idempotent read
const RETRY_DELAY_MS: u64 = 500;

/// Proxy API client
pub struct HttpBackend {
    client: Client,
    base_url: String,
    read_retries: u32,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: client_with_timeout(config.request_timeout),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            read_retries: config.read_retries,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, mapping non-2xx responses to [`ApiError::Status`]
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(ApiError::from_body(status.as_u16(), &body))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// GET with bounded retries on transient failures. Only for reads.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let mut attempt = 0;
        loop {
            let request = self.client.get(&url).bearer_auth(token);
            match self.execute_json(request).await {
                Err(e) if e.is_transient() && attempt < self.read_retries => {
                    attempt += 1;
                    warn!(path, attempt, error = %e, "Transient read failure, retrying");
                    sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt))).await;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        debug!(username = %request.username, "POST /auth/login/json");
        let builder = self.client.post(self.url("/auth/login/json")).json(request);
        self.execute_json(builder).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        debug!(username = %request.username, "POST /auth/register");
        let builder = self.client.post(self.url("/auth/register")).json(request);
        self.execute_json(builder).await
    }

    async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        self.get_json("/auth/me", token).await
    }

    async fn send_message(
        &self,
        token: &str,
        request: &SendMessageRequest,
    ) -> Result<ChatResponse, ApiError> {
        debug!(
            model = %request.ai_model,
            conversation_id = ?request.conversation_id,
            "POST /chat/send"
        );
        let builder = self
            .client
            .post(self.url("/chat/send"))
            .bearer_auth(token)
            .json(request);
        self.execute_json(builder).await
    }

    async fn list_conversations(&self, token: &str) -> Result<Vec<ConversationSummary>, ApiError> {
        self.get_json("/chat/conversations", token).await
    }

    async fn get_conversation(&self, token: &str, id: i64) -> Result<ConversationRecord, ApiError> {
        self.get_json(&format!("/chat/conversations/{id}"), token)
            .await
    }

    async fn delete_conversation(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let builder = self
            .client
            .delete(self.url(&format!("/chat/conversations/{id}")))
            .bearer_auth(token);
        self.execute(builder).await.map(|_| ())
    }

    async fn get_budget(&self, token: &str) -> Result<BudgetSnapshot, ApiError> {
        self.get_json("/budget", token).await
    }

    async fn set_budget(
        &self,
        token: &str,
        settings: &BudgetSettings,
    ) -> Result<BudgetSnapshot, ApiError> {
        let builder = self
            .client
            .post(self.url("/budget"))
            .bearer_auth(token)
            .json(settings);
        self.execute_json(builder).await
    }

    async fn disable_budget(&self, token: &str) -> Result<(), ApiError> {
        let builder = self.client.delete(self.url("/budget")).bearer_auth(token);
        self.execute(builder).await.map(|_| ())
    }

    async fn upload_file(&self, token: &str, file: FileUpload) -> Result<UploadedFile, ApiError> {
        debug!(filename = %file.filename, size = file.bytes.len(), "POST /files/upload");
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(&file.content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let builder = self
            .client
            .post(self.url("/files/upload"))
            .bearer_auth(token)
            .multipart(form);
        self.execute_json(builder).await
    }

    async fn available_models(&self, token: &str) -> Result<AvailableModels, ApiError> {
        self.get_json("/chat/models/available", token).await
    }
}
