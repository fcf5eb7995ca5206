//! Session state machine
//!
//! Transitions are pure: each returns the [`PersistEffect`] the caller must
//! apply to the token store. `Uninitialized -> Initializing ->
//! {Authenticated | Unauthenticated}`; nothing returns to `Initializing`.

use serde::Serialize;

use crate::api::{User, UserPatch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Initializing,
    Authenticated,
    Unauthenticated,
}

/// Storage write implied by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistEffect {
    Store(String),
    Clear,
    None,
}

/// Outcome of starting initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitStep {
    /// Already initialized, or a login/logout got there first
    AlreadyDone,
    /// No persisted token; now `Unauthenticated`
    NoToken,
    /// Persisted token must be validated with this value
    Validate(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    token: Option<String>,
    user: Option<User>,
    phase: SessionPhase,
    error: Option<String>,
}

impl SessionState {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// A token alone is not enough: the user must have been fetched with it
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
            && self.token.as_deref().is_some_and(|t| !t.is_empty())
            && self.user.is_some()
    }

    /// Token present but not confirmed by a successful fetch
    pub fn is_pending_confirmation(&self) -> bool {
        self.token.is_some() && !self.is_authenticated()
    }

    pub(crate) fn begin_init(&mut self, stored_token: Option<String>) -> InitStep {
        if self.phase != SessionPhase::Uninitialized {
            return InitStep::AlreadyDone;
        }
        match stored_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                self.phase = SessionPhase::Initializing;
                self.token = Some(token.clone());
                InitStep::Validate(token)
            }
            None => {
                self.phase = SessionPhase::Unauthenticated;
                InitStep::NoToken
            }
        }
    }

    /// Successful login or registration
    pub(crate) fn signed_in(&mut self, token: String, user: User) -> PersistEffect {
        self.token = Some(token.clone());
        self.user = Some(user);
        self.phase = SessionPhase::Authenticated;
        self.error = None;
        PersistEffect::Store(token)
    }

    /// Profile fetched with `token`. Ignored if the token changed meanwhile.
    pub(crate) fn user_fetched(&mut self, token: &str, user: User) -> PersistEffect {
        if self.token.as_deref() != Some(token) {
            return PersistEffect::None;
        }
        self.user = Some(user);
        self.phase = SessionPhase::Authenticated;
        PersistEffect::None
    }

    /// Backend rejected `token`: forced logout, unless a different token is
    /// already in place.
    pub(crate) fn token_rejected(&mut self, token: &str) -> PersistEffect {
        if self.token.as_deref() != Some(token) {
            return PersistEffect::None;
        }
        self.token = None;
        self.user = None;
        self.phase = SessionPhase::Unauthenticated;
        PersistEffect::Clear
    }

    /// Network or server failure while fetching the profile. The token is
    /// kept; a session that was still initializing settles as unconfirmed.
    pub(crate) fn fetch_failed(&mut self, token: &str, reason: String) -> PersistEffect {
        if self.token.as_deref() != Some(token) {
            return PersistEffect::None;
        }
        if self.phase == SessionPhase::Initializing {
            self.phase = SessionPhase::Unauthenticated;
        }
        self.error = Some(reason);
        PersistEffect::None
    }

    pub(crate) fn signed_out(&mut self) -> PersistEffect {
        self.token = None;
        self.user = None;
        self.phase = SessionPhase::Unauthenticated;
        self.error = None;
        PersistEffect::Clear
    }

    /// No-op unless authenticated
    pub(crate) fn update_user(&mut self, patch: UserPatch) {
        if !self.is_authenticated() {
            return;
        }
        if let Some(user) = self.user.as_mut() {
            user.apply(patch);
        }
    }

    pub(crate) fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }
}
