//! Session manager
//!
//! Owns the bearer token and the live user profile. Every transition runs
//! under the state write lock together with its storage write, so a reload
//! never reads a token the in-memory session no longer holds.

use std::sync::{Arc, RwLock};

use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::state::{InitStep, PersistEffect, SessionPhase, SessionState};
use super::storage::TokenStore;
use crate::api::{Attribution, ChatBackend, LoginRequest, RegisterRequest, User, UserPatch};
use crate::error::ChatError;
use crate::utils::{acquire_read_lock, acquire_write_lock};

/// Registration form
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub attribution: Attribution,
}

pub struct SessionManager {
    backend: Arc<dyn ChatBackend>,
    store: Arc<dyn TokenStore>,
    state: RwLock<SessionState>,
    init: OnceCell<()>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn ChatBackend>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            backend,
            store,
            state: RwLock::new(SessionState::default()),
            init: OnceCell::new(),
        }
    }

    /// Run a transition and apply its storage effect under the same lock
    fn transition<F>(&self, f: F)
    where
        F: FnOnce(&mut SessionState) -> PersistEffect,
    {
        let mut state = acquire_write_lock(&self.state);
        let result = match f(&mut state) {
            PersistEffect::Store(token) => self.store.save(&token),
            PersistEffect::Clear => self.store.clear(),
            PersistEffect::None => Ok(()),
        };
        if let Err(e) = result {
            error!(error = %e, "Failed to persist session token");
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, ChatError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.backend.login(&request).await {
            Ok(response) => {
                info!(user_id = response.user.id, "Logged in");
                let user = response.user.clone();
                self.transition(|s| s.signed_in(response.access_token, response.user));
                Ok(user)
            }
            Err(e) => {
                let err = ChatError::from_auth(e, "Invalid username or password");
                warn!(username, error = %err, "Login failed");
                acquire_write_lock(&self.state).set_error(err.to_string());
                Err(err)
            }
        }
    }

    /// Attribution fields are passed through untouched
    pub async fn register(&self, form: Registration) -> Result<User, ChatError> {
        let request = RegisterRequest {
            username: form.username,
            password: form.password,
            email: form.email.filter(|e| !e.trim().is_empty()),
            attribution: form.attribution,
        };
        match self.backend.register(&request).await {
            Ok(response) => {
                info!(user_id = response.user.id, "Registered");
                let user = response.user.clone();
                self.transition(|s| s.signed_in(response.access_token, response.user));
                Ok(user)
            }
            Err(e) => {
                let err = ChatError::from_auth(e, "Registration failed");
                warn!(username = %request.username, error = %err, "Registration failed");
                acquire_write_lock(&self.state).set_error(err.to_string());
                Err(err)
            }
        }
    }

    /// Re-fetch the profile. A rejected token logs the session out; any
    /// other failure keeps the token.
    pub async fn fetch_user(&self) -> Result<User, ChatError> {
        let token = self.require_token()?;
        self.fetch_user_with(token).await
    }

    async fn fetch_user_with(&self, token: String) -> Result<User, ChatError> {
        match self.backend.current_user(&token).await {
            Ok(user) => {
                debug!(user_id = user.id, balance = user.balance, "User fetched");
                self.transition(|s| s.user_fetched(&token, user.clone()));
                Ok(user)
            }
            Err(e) if e.is_unauthorized() => {
                info!("Token rejected by backend, logging out");
                self.transition(|s| s.token_rejected(&token));
                Err(ChatError::Unauthorized)
            }
            Err(e) => {
                let err = ChatError::from_read(e);
                warn!(error = %err, "Failed to fetch user, keeping session");
                self.transition(|s| s.fetch_failed(&token, err.to_string()));
                Err(err)
            }
        }
    }

    /// Never fails
    pub fn logout(&self) {
        self.transition(SessionState::signed_out);
        info!("Logged out");
    }

    /// Rehydrate from storage once. Concurrent callers share the same
    /// in-flight initialization.
    pub async fn ensure_initialized(&self) {
        self.init.get_or_init(|| self.initialize()).await;
    }

    async fn initialize(&self) {
        let stored = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Failed to read persisted token");
                None
            }
        };
        let step = acquire_write_lock(&self.state).begin_init(stored);
        match step {
            InitStep::Validate(token) => {
                debug!("Validating persisted token");
                // Outcome is recorded in the session state
                let _ = self.fetch_user_with(token).await;
            }
            InitStep::NoToken => debug!("No persisted token"),
            InitStep::AlreadyDone => {}
        }
    }

    /// Merge fields into the live profile; no-op when signed out
    pub fn update_user(&self, patch: UserPatch) {
        acquire_write_lock(&self.state).update_user(patch);
    }

    pub fn token(&self) -> Option<String> {
        acquire_read_lock(&self.state).token().map(str::to_string)
    }

    /// Token for an authenticated call, checked locally before any request
    pub fn require_token(&self) -> Result<String, ChatError> {
        self.token()
            .filter(|t| !t.is_empty())
            .ok_or(ChatError::Unauthorized)
    }

    pub fn user(&self) -> Option<User> {
        acquire_read_lock(&self.state).user().cloned()
    }

    /// Live balance, 0 when signed out
    pub fn balance(&self) -> i64 {
        acquire_read_lock(&self.state)
            .user()
            .map_or(0, |u| u.balance)
    }

    pub fn is_authenticated(&self) -> bool {
        acquire_read_lock(&self.state).is_authenticated()
    }

    pub fn phase(&self) -> SessionPhase {
        acquire_read_lock(&self.state).phase()
    }

    pub fn state(&self) -> SessionState {
        acquire_read_lock(&self.state).clone()
    }

    pub fn clear_error(&self) {
        acquire_write_lock(&self.state).clear_error();
    }
}
