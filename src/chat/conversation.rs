//! Conversation controller
//!
//! Owns the active conversation: its id, the append-only message log, the
//! selected model and the in-flight send. Locks are never held across an
//! await; every remote result is applied in a fresh critical section.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use super::types::{AttachmentRef, ConversationState, Message, SendReceipt};
use crate::api::{ChatBackend, ConversationSummary, SendMessageRequest, UserPatch};
use crate::auth::SessionManager;
use crate::error::ChatError;
use crate::utils::{acquire_read_lock, acquire_write_lock, truncate_chars};

/// Local title length for a conversation created by its first send
const TITLE_CHARS: usize = 50;

pub struct ConversationController {
    backend: Arc<dyn ChatBackend>,
    session: Arc<SessionManager>,
    state: RwLock<ConversationState>,
    conversations: RwLock<Vec<ConversationSummary>>,
    /// Issuance counter; only the latest-tagged load may apply its result
    load_seq: AtomicU64,
}

impl ConversationController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        session: Arc<SessionManager>,
        default_model: &str,
    ) -> Self {
        Self {
            backend,
            session,
            state: RwLock::new(ConversationState::new(default_model)),
            conversations: RwLock::new(Vec::new()),
            load_seq: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ConversationState {
        acquire_read_lock(&self.state).clone()
    }

    pub fn selected_model(&self) -> String {
        acquire_read_lock(&self.state).selected_model.clone()
    }

    /// Cached conversation list from the last [`Self::load_conversations`]
    pub fn conversations(&self) -> Vec<ConversationSummary> {
        acquire_read_lock(&self.conversations).clone()
    }

    /// Affects only the next send
    pub fn select_model(&self, model: &str) {
        let mut state = acquire_write_lock(&self.state);
        debug!(from = %state.selected_model, to = model, "Model selected");
        state.selected_model = model.to_string();
    }

    pub fn clear_error(&self) {
        acquire_write_lock(&self.state).error = None;
    }

    /// Drop everything, including the list (on logout)
    pub fn reset(&self) {
        self.new_conversation();
        acquire_write_lock(&self.conversations).clear();
    }

    fn next_seq(&self) -> u64 {
        self.load_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.load_seq.load(Ordering::SeqCst) == seq
    }

    pub fn new_conversation(&self) {
        self.next_seq();
        let mut state = acquire_write_lock(&self.state);
        state.reset();
        state.is_loading = false;
        debug!("New conversation");
    }

    /// Replace the live conversation with a server copy.
    ///
    /// Rejected while a send is in flight. A response that arrives after a
    /// newer load, a new conversation or a send was issued is discarded with
    /// [`ChatError::Superseded`].
    pub async fn load_conversation(&self, id: i64) -> Result<(), ChatError> {
        let token = self.session.require_token()?;
        let seq = {
            let mut state = acquire_write_lock(&self.state);
            if state.is_sending {
                return Err(ChatError::SendInFlight);
            }
            state.is_loading = true;
            state.error = None;
            self.next_seq()
        };

        let result = self.backend.get_conversation(&token, id).await;

        let mut state = acquire_write_lock(&self.state);
        if !self.is_latest(seq) {
            debug!(conversation_id = id, seq, "Discarding stale conversation load");
            return Err(ChatError::Superseded);
        }
        state.is_loading = false;
        match result {
            Ok(record) => {
                debug!(
                    conversation_id = record.id,
                    messages = record.messages.len(),
                    "Conversation loaded"
                );
                state.conversation_id = Some(record.id);
                state.title = Some(record.title);
                state.messages = record.messages.into_iter().map(Message::from).collect();
                state.error = None;
                state.last_coins_spent = None;
                Ok(())
            }
            Err(e) => {
                let err = ChatError::from_read(e);
                warn!(conversation_id = id, error = %err, "Failed to load conversation");
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn load_conversations(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        let token = self.session.require_token()?;
        match self.backend.list_conversations(&token).await {
            Ok(list) => {
                debug!(count = list.len(), "Conversations listed");
                *acquire_write_lock(&self.conversations) = list.clone();
                Ok(list)
            }
            Err(e) => {
                let err = ChatError::from_read(e);
                warn!(error = %err, "Failed to list conversations");
                acquire_write_lock(&self.state).error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Deleting the active conversation resets to a fresh one
    pub async fn delete_conversation(&self, id: i64) -> Result<(), ChatError> {
        let token = self.session.require_token()?;
        if let Err(e) = self.backend.delete_conversation(&token, id).await {
            let err = ChatError::from_read(e);
            acquire_write_lock(&self.state).error = Some(err.to_string());
            return Err(err);
        }
        info!(conversation_id = id, "Conversation deleted");
        acquire_write_lock(&self.conversations).retain(|c| c.id != id);

        let is_active = acquire_read_lock(&self.state).conversation_id == Some(id);
        if is_active {
            self.new_conversation();
        }
        Ok(())
    }

    /// Send one message.
    ///
    /// The user message is appended before the request goes out. On failure
    /// it stays in the log; only `error` and `is_sending` change. The reply
    /// is appended to whatever log is live when it arrives.
    ///
    /// Blank content is only accepted alongside an attachment. The request
    /// then goes out with an empty `message`, and the server may reject it
    /// (it requires at least one character); that rejection surfaces as a
    /// send error like any other.
    pub async fn send(
        &self,
        content: &str,
        attachment: Option<AttachmentRef>,
    ) -> Result<SendReceipt, ChatError> {
        let content = content.trim();
        if content.is_empty() && attachment.is_none() {
            acquire_write_lock(&self.state).error = Some(ChatError::EmptyMessage.to_string());
            return Err(ChatError::EmptyMessage);
        }
        let token = self.session.require_token()?;

        let request = {
            let mut state = acquire_write_lock(&self.state);
            if state.is_sending {
                return Err(ChatError::SendInFlight);
            }
            // A load still in flight must not replace the log we append to
            self.next_seq();
            state.is_loading = false;
            state.messages.push(Message::optimistic(content));
            state.is_sending = true;
            state.error = None;
            state.last_coins_spent = None;
            SendMessageRequest {
                message: content.to_string(),
                ai_model: state.selected_model.clone(),
                conversation_id: state.conversation_id,
                file_id: attachment.as_ref().map(|a| a.file_id.clone()),
                file_type: attachment.as_ref().map(|a| a.kind),
            }
        };

        let result = self.backend.send_message(&token, &request).await;

        match result {
            Ok(response) => {
                {
                    let mut state = acquire_write_lock(&self.state);
                    state
                        .messages
                        .push(Message::from_reply(&response, &request.ai_model));
                    if state.conversation_id.is_none() {
                        state.conversation_id = Some(response.conversation_id);
                        state.title = Some(truncate_chars(content, TITLE_CHARS));
                    }
                    state.last_coins_spent = response.coins_spent;
                    state.is_sending = false;
                }
                if let Some(balance) = response.balance_remaining {
                    self.session.update_user(UserPatch::balance(balance));
                }
                info!(
                    conversation_id = response.conversation_id,
                    model = %request.ai_model,
                    coins_spent = ?response.coins_spent,
                    "Message sent"
                );
                Ok(SendReceipt {
                    conversation_id: response.conversation_id,
                    coins_spent: response.coins_spent,
                    balance_remaining: response.balance_remaining,
                    tokens_used: response
                        .assistant_message
                        .as_ref()
                        .and_then(|r| r.tokens_used)
                        .or(response.tokens_used),
                })
            }
            Err(e) => {
                let err = ChatError::from_send(e);
                warn!(model = %request.ai_model, error = %err, "Send failed");
                let mut state = acquire_write_lock(&self.state);
                state.error = Some(err.to_string());
                state.is_sending = false;
                Err(err)
            }
        }
    }
}
