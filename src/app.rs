//! Application state and the terminal loop
//!
//! All components are built once here and shared through [`AppState`];
//! nothing is global except the pooled HTTP client.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::api::{Attribution, ChatBackend, HttpBackend};
use crate::auth::{token_store_for, SessionManager, TokenStore};
use crate::billing::BudgetTracker;
use crate::chat::{AttachmentComposer, ConversationController, SendOrchestrator};
use crate::commands::{self, Outcome};
use crate::config::ClientConfig;

pub struct AppState {
    pub backend: Arc<dyn ChatBackend>,
    pub session: Arc<SessionManager>,
    pub budget: Arc<BudgetTracker>,
    pub conversation: Arc<ConversationController>,
    pub composer: Arc<AttachmentComposer>,
    pub orchestrator: SendOrchestrator,
    pub attribution: Attribution,
}

impl AppState {
    /// Wire the HTTP backend and the configured token store
    pub fn new(config: &ClientConfig) -> Self {
        let backend: Arc<dyn ChatBackend> = Arc::new(HttpBackend::new(config));
        Self::with_backend(config, backend, token_store_for(config))
    }

    pub fn with_backend(
        config: &ClientConfig,
        backend: Arc<dyn ChatBackend>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let session = Arc::new(SessionManager::new(backend.clone(), store));
        let budget = Arc::new(BudgetTracker::new(backend.clone(), session.clone()));
        let conversation = Arc::new(ConversationController::new(
            backend.clone(),
            session.clone(),
            &config.default_model,
        ));
        let composer = Arc::new(AttachmentComposer::new(backend.clone(), session.clone()));
        let orchestrator = SendOrchestrator::new(
            session.clone(),
            budget.clone(),
            conversation.clone(),
            composer.clone(),
        );
        Self {
            backend,
            session,
            budget,
            conversation,
            composer,
            orchestrator,
            attribution: config.attribution.clone(),
        }
    }

    /// Rehydrate the session and prime the budget
    pub async fn startup(&self) {
        self.session.ensure_initialized().await;
        if self.session.is_authenticated() {
            self.on_signed_in().await;
        }
    }

    pub(crate) async fn on_signed_in(&self) {
        self.conversation.new_conversation();
        if let Err(e) = self.budget.refresh().await {
            warn!(error = %e, "Failed to load budget after sign-in");
        }
    }

    pub(crate) fn on_signed_out(&self) {
        self.budget.clear();
        self.conversation.reset();
        self.composer.remove();
    }

    /// Parse and run one input line
    pub async fn handle_line(&self, line: &str) -> Outcome {
        let command = match commands::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Outcome::Output(String::new()),
            Err(usage) => return Outcome::Output(usage),
        };
        debug!(?command, "Dispatching command");
        match commands::dispatch(self, command).await {
            Ok(outcome) => outcome,
            Err(message) => Outcome::Output(format!("Error: {}", message)),
        }
    }

    fn prompt(&self) -> String {
        match self.session.user() {
            Some(user) => format!("[{} | {}] > ", user.username, user.balance),
            None => "[signed out] > ".to_string(),
        }
    }
}

/// Line-oriented front-end over stdin/stdout
pub async fn run_repl(state: AppState) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    state.startup().await;
    let greeting = match state.session.user() {
        Some(user) => format!("Signed in as {}. Type /help for commands.\n", user.username),
        None => "Not signed in. Use /login or /register, /help for commands.\n".to_string(),
    };
    stdout.write_all(greeting.as_bytes()).await?;

    loop {
        stdout.write_all(state.prompt().as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match state.handle_line(&line).await {
            Outcome::Output(text) if text.is_empty() => {}
            Outcome::Output(text) => {
                stdout.write_all(text.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            Outcome::Quit => break,
        }
    }

    info!("Exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::testing::FakeBackend;

    fn app(backend: &Arc<FakeBackend>) -> AppState {
        AppState::with_backend(
            &ClientConfig::default(),
            backend.clone(),
            Arc::new(MemoryTokenStore::default()),
        )
    }

    fn output(outcome: Outcome) -> String {
        match outcome {
            Outcome::Output(text) => text,
            Outcome::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn test_login_send_and_history() {
        let backend = Arc::new(FakeBackend::new());
        let state = app(&backend);
        state.startup().await;
        assert_eq!(backend.total_calls(), 0);

        let text = output(state.handle_line("/login alice secret").await);
        assert!(text.contains("Signed in as alice"));
        assert_eq!(backend.calls("get_budget"), 1);

        let text = output(state.handle_line("hello").await);
        assert!(text.contains("echo: hello"));
        assert!(text.contains("balance 997"));

        let text = output(state.handle_line("/history").await);
        assert!(text.starts_with("#42 hello"));
        assert!(text.contains("you> hello"));
    }

    #[tokio::test]
    async fn test_signed_out_send_reports_error() {
        let backend = Arc::new(FakeBackend::new());
        let state = app(&backend);

        let text = output(state.handle_line("hello").await);
        assert_eq!(text, "Error: Not signed in or session expired");
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_budget_commands() {
        let backend = Arc::new(FakeBackend::new());
        let state = app(&backend);
        state.handle_line("/login alice secret").await;

        let text = output(state.handle_line("/budget set week 700").await);
        assert!(text.starts_with("Budget saved (100 per day)"));
        assert!(state.budget.gate(1000).is_allowed());

        let text = output(state.handle_line("/budget off").await);
        assert_eq!(text, "Daily budget disabled");
    }

    #[tokio::test]
    async fn test_logout_clears_conversation() {
        let backend = Arc::new(FakeBackend::new());
        let state = app(&backend);
        state.handle_line("/login alice secret").await;
        state.handle_line("hello").await;

        output(state.handle_line("/logout").await);
        assert!(state.conversation.state().messages.is_empty());
        assert!(state.budget.snapshot().is_none());
        assert_eq!(state.handle_line("/quit").await, Outcome::Quit);
    }

    #[tokio::test]
    async fn test_models_fall_back_when_catalog_fails() {
        let backend = Arc::new(FakeBackend::new());
        let state = app(&backend);
        state.handle_line("/login alice secret").await;

        let text = output(state.handle_line("/models").await);
        assert!(text.contains("* google/gemini-2.0-flash-001"));
        assert!(text.contains("anthropic/claude-sonnet-4"));
    }
}
