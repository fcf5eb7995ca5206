//! Send orchestration
//!
//! One user send: token check, budget gate, capability check, then the
//! controller's send. A successful send schedules a budget refresh in the
//! background.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::attachment::AttachmentComposer;
use super::conversation::ConversationController;
use super::types::SendReceipt;
use crate::auth::SessionManager;
use crate::billing::{BudgetCheck, BudgetTracker};
use crate::error::ChatError;
use crate::models::check_attachment;

pub struct SendOrchestrator {
    session: Arc<SessionManager>,
    budget: Arc<BudgetTracker>,
    conversation: Arc<ConversationController>,
    composer: Arc<AttachmentComposer>,
    budget_refresh: Mutex<Option<JoinHandle<()>>>,
}

impl SendOrchestrator {
    pub fn new(
        session: Arc<SessionManager>,
        budget: Arc<BudgetTracker>,
        conversation: Arc<ConversationController>,
        composer: Arc<AttachmentComposer>,
    ) -> Self {
        Self {
            session,
            budget,
            conversation,
            composer,
            budget_refresh: Mutex::new(None),
        }
    }

    /// Send `content` with the composer's current attachment, if any
    pub async fn submit(&self, content: &str) -> Result<SendReceipt, ChatError> {
        self.session.require_token()?;

        if let BudgetCheck::Denied { reason } = self.budget.gate(self.session.balance()) {
            debug!(%reason, "Send blocked by budget gate");
            return Err(ChatError::BudgetBlocked(reason));
        }

        let attachment = self.composer.current();
        if let Some(attachment) = &attachment {
            check_attachment(&self.conversation.selected_model(), attachment.kind)?;
        }

        let result = self
            .conversation
            .send(content, attachment.as_ref().map(|a| a.reference()))
            .await;

        match &result {
            Ok(_) => {
                self.composer.remove();
                self.schedule_budget_refresh().await;
            }
            // The file went out with the request
            Err(e) if !e.is_preflight() && attachment.is_some() => {
                self.composer.remove();
            }
            Err(_) => {}
        }
        result
    }

    async fn schedule_budget_refresh(&self) {
        let budget = Arc::clone(&self.budget);
        let handle = tokio::spawn(async move {
            if let Err(e) = budget.refresh().await {
                warn!(error = %e, "Background budget refresh failed");
            }
        });
        *self.budget_refresh.lock().await = Some(handle);
    }

    /// Wait for the last scheduled budget refresh to finish
    pub async fn wait_for_budget_refresh(&self) {
        let handle = self.budget_refresh.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Budget refresh task panicked");
            }
        }
    }
}
