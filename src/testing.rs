//! Scripted in-memory backend for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{
    ApiError, AssistantReply, AuthResponse, AvailableModels, ChatBackend, ChatResponse,
    ConversationRecord, ConversationSummary, FileUpload, LoginRequest, MessageRecord,
    RegisterRequest, Role, SendMessageRequest, UploadedFile, User,
};
use crate::auth::{MemoryTokenStore, SessionManager};
use crate::billing::{BudgetSettings, BudgetSnapshot};
use crate::models::AttachmentKind;

type Reply<T> = Mutex<VecDeque<Result<T, ApiError>>>;

pub(crate) fn sample_user(balance: i64) -> User {
    User {
        id: 1,
        username: "alice".to_string(),
        email: Some("alice@example.com".to_string()),
        balance,
        is_admin: false,
        subscription_plan: None,
        created_at: None,
    }
}

fn conversation_record(id: i64, messages: usize) -> ConversationRecord {
    ConversationRecord {
        id,
        title: format!("Conversation {}", id),
        ai_model: None,
        messages: (0..messages)
            .map(|i| MessageRecord {
                id: id * 100 + i as i64,
                role: if i % 2 == 0 { Role::User } else { Role::Assistant },
                content: format!("message {}", i),
                model_used: None,
                tokens_used: None,
                created_at: None,
            })
            .collect(),
    }
}

/// Session signed in against `backend` (one `login` call)
pub(crate) async fn signed_in_session(backend: &Arc<FakeBackend>) -> Arc<SessionManager> {
    let session = Arc::new(SessionManager::new(
        backend.clone(),
        Arc::new(MemoryTokenStore::default()),
    ));
    session
        .login("alice", "password")
        .await
        .expect("fake login succeeds");
    session
}

/// Unscripted calls succeed with plausible defaults
#[derive(Default)]
pub(crate) struct FakeBackend {
    calls: Mutex<HashMap<&'static str, usize>>,
    login: Reply<AuthResponse>,
    register: Reply<AuthResponse>,
    current_user: Reply<User>,
    send: Reply<ChatResponse>,
    conversation: Reply<ConversationRecord>,
    budget: Reply<BudgetSnapshot>,
    /// Sends never resolve while set
    pub hang_send: AtomicBool,
    /// Each conversation load waits on the next gate, if one is queued
    load_gates: Mutex<VecDeque<Arc<Notify>>>,
    send_gates: Mutex<VecDeque<Arc<Notify>>>,
    last_register: Mutex<Option<RegisterRequest>>,
    last_send: Mutex<Option<SendMessageRequest>>,
    last_budget_settings: Mutex<Option<BudgetSettings>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, endpoint: &'static str) {
        *self.calls.lock().unwrap().entry(endpoint).or_insert(0) += 1;
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn script_login(&self, reply: Result<AuthResponse, ApiError>) {
        self.login.lock().unwrap().push_back(reply);
    }

    pub fn script_register(&self, reply: Result<AuthResponse, ApiError>) {
        self.register.lock().unwrap().push_back(reply);
    }

    pub fn script_current_user(&self, reply: Result<User, ApiError>) {
        self.current_user.lock().unwrap().push_back(reply);
    }

    pub fn script_send(&self, reply: Result<ChatResponse, ApiError>) {
        self.send.lock().unwrap().push_back(reply);
    }

    pub fn script_conversation(&self, reply: Result<ConversationRecord, ApiError>) {
        self.conversation.lock().unwrap().push_back(reply);
    }

    pub fn script_budget(&self, reply: Result<BudgetSnapshot, ApiError>) {
        self.budget.lock().unwrap().push_back(reply);
    }

    /// Queue a gate the next conversation load waits on
    pub fn gate_next_load(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.load_gates.lock().unwrap().push_back(gate.clone());
        gate
    }

    /// Queue a gate the next send waits on
    pub fn gate_next_send(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.send_gates.lock().unwrap().push_back(gate.clone());
        gate
    }

    pub fn last_register(&self) -> Option<RegisterRequest> {
        self.last_register.lock().unwrap().clone()
    }

    pub fn last_send(&self) -> Option<SendMessageRequest> {
        self.last_send.lock().unwrap().clone()
    }

    pub fn last_budget_settings(&self) -> Option<BudgetSettings> {
        self.last_budget_settings.lock().unwrap().clone()
    }

    fn next<T>(reply: &Reply<T>) -> Option<Result<T, ApiError>> {
        reply.lock().unwrap().pop_front()
    }

    fn auth_response(username: &str) -> AuthResponse {
        AuthResponse {
            access_token: format!("token-{}", username),
            token_type: Some("bearer".to_string()),
            user: User {
                username: username.to_string(),
                ..sample_user(1000)
            },
        }
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.record("login");
        Self::next(&self.login).unwrap_or_else(|| Ok(Self::auth_response(&request.username)))
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.record("register");
        *self.last_register.lock().unwrap() = Some(request.clone());
        Self::next(&self.register).unwrap_or_else(|| Ok(Self::auth_response(&request.username)))
    }

    async fn current_user(&self, _token: &str) -> Result<User, ApiError> {
        self.record("current_user");
        Self::next(&self.current_user).unwrap_or_else(|| Ok(sample_user(1000)))
    }

    async fn send_message(
        &self,
        _token: &str,
        request: &SendMessageRequest,
    ) -> Result<ChatResponse, ApiError> {
        self.record("send_message");
        *self.last_send.lock().unwrap() = Some(request.clone());
        if self.hang_send.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        let gate = self.send_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Self::next(&self.send).unwrap_or_else(|| {
            Ok(ChatResponse {
                conversation_id: request.conversation_id.unwrap_or(42),
                assistant_message: Some(AssistantReply {
                    id: Some(1001),
                    content: format!("echo: {}", request.message),
                    tokens_used: Some(12),
                    model_used: Some(request.ai_model.clone()),
                }),
                response: None,
                tokens_used: Some(12),
                coins_spent: Some(3),
                balance_remaining: Some(997),
            })
        })
    }

    async fn list_conversations(&self, _token: &str) -> Result<Vec<ConversationSummary>, ApiError> {
        self.record("list_conversations");
        Ok(vec![7, 42]
            .into_iter()
            .map(|id| ConversationSummary {
                id,
                title: format!("Conversation {}", id),
                ai_model: None,
                message_count: 2,
                created_at: None,
                updated_at: None,
            })
            .collect())
    }

    async fn get_conversation(&self, _token: &str, id: i64) -> Result<ConversationRecord, ApiError> {
        self.record("get_conversation");
        let gate = self.load_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Self::next(&self.conversation).unwrap_or_else(|| Ok(conversation_record(id, 2)))
    }

    async fn delete_conversation(&self, _token: &str, _id: i64) -> Result<(), ApiError> {
        self.record("delete_conversation");
        Ok(())
    }

    async fn get_budget(&self, _token: &str) -> Result<BudgetSnapshot, ApiError> {
        self.record("get_budget");
        Self::next(&self.budget).unwrap_or_else(|| {
            Ok(BudgetSnapshot {
                balance: 997,
                daily_remaining: 997,
                can_send: true,
                message: "OK".to_string(),
                ..Default::default()
            })
        })
    }

    async fn set_budget(
        &self,
        _token: &str,
        settings: &BudgetSettings,
    ) -> Result<BudgetSnapshot, ApiError> {
        self.record("set_budget");
        *self.last_budget_settings.lock().unwrap() = Some(settings.clone());
        let period_days = settings.period.days();
        let daily_limit = if period_days > 0 { settings.coins / period_days } else { 0 };
        Ok(BudgetSnapshot {
            budget_period: settings.period,
            budget_coins: settings.coins,
            daily_limit,
            daily_remaining: daily_limit,
            period_days,
            balance: 1000,
            can_send: true,
            ..Default::default()
        })
    }

    async fn disable_budget(&self, _token: &str) -> Result<(), ApiError> {
        self.record("disable_budget");
        Ok(())
    }

    async fn upload_file(&self, _token: &str, file: FileUpload) -> Result<UploadedFile, ApiError> {
        self.record("upload_file");
        Ok(UploadedFile {
            file_id: format!("file-{}", file.filename),
            kind: AttachmentKind::from_content_type(&file.content_type)
                .unwrap_or(AttachmentKind::Document),
            size: file.bytes.len() as u64,
            filename: file.filename,
            content_type: file.content_type,
        })
    }

    async fn available_models(&self, _token: &str) -> Result<AvailableModels, ApiError> {
        self.record("available_models");
        Err(ApiError::Transport("catalog offline".to_string()))
    }
}
