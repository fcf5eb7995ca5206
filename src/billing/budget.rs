//! Budget tracker and settings draft
//!
//! Caches the last server budget snapshot so the send gate can run without a
//! network call.

use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use super::limits;
use super::types::{BudgetCheck, BudgetPeriod, BudgetSettings, BudgetSnapshot, BudgetStatus};
use crate::api::{ChatBackend, UserPatch};
use crate::auth::SessionManager;
use crate::error::ChatError;
use crate::utils::{acquire_read_lock, acquire_write_lock};

pub struct BudgetTracker {
    backend: Arc<dyn ChatBackend>,
    session: Arc<SessionManager>,
    snapshot: RwLock<Option<BudgetSnapshot>>,
}

impl BudgetTracker {
    pub fn new(backend: Arc<dyn ChatBackend>, session: Arc<SessionManager>) -> Self {
        Self {
            backend,
            session,
            snapshot: RwLock::new(None),
        }
    }

    /// Last snapshot received from the server, if any
    pub fn snapshot(&self) -> Option<BudgetSnapshot> {
        acquire_read_lock(&self.snapshot).clone()
    }

    /// Re-read the budget from the server
    pub async fn refresh(&self) -> Result<BudgetSnapshot, ChatError> {
        let token = self.session.require_token()?;
        let snapshot = self
            .backend
            .get_budget(&token)
            .await
            .map_err(ChatError::from_read)?;
        debug!(
            period = %snapshot.budget_period,
            daily_spent = snapshot.daily_spent,
            "Budget refreshed"
        );
        self.store(snapshot.clone());
        Ok(snapshot)
    }

    /// Persist new settings. Coins are forced to 0 for the `none` period.
    pub async fn save(&self, settings: BudgetSettings) -> Result<BudgetSnapshot, ChatError> {
        let settings = if settings.period.is_none() {
            BudgetSettings {
                period: BudgetPeriod::None,
                coins: 0,
            }
        } else if settings.coins <= 0 {
            return Err(ChatError::Rejected(
                "Budget must be greater than 0".to_string(),
            ));
        } else {
            settings
        };

        let token = self.session.require_token()?;
        let snapshot = self
            .backend
            .set_budget(&token, &settings)
            .await
            .map_err(ChatError::from_read)?;
        info!(period = %settings.period, coins = settings.coins, "Budget saved");
        self.store(snapshot.clone());
        Ok(snapshot)
    }

    /// Turn the daily limit off
    pub async fn disable(&self) -> Result<(), ChatError> {
        let token = self.session.require_token()?;
        self.backend
            .disable_budget(&token)
            .await
            .map_err(ChatError::from_read)?;
        info!("Budget disabled");

        let mut guard = acquire_write_lock(&self.snapshot);
        if let Some(snapshot) = guard.as_mut() {
            snapshot.budget_period = BudgetPeriod::None;
            snapshot.budget_coins = 0;
            snapshot.daily_limit = 0;
            snapshot.period_days = 0;
            snapshot.daily_remaining = snapshot.balance;
            snapshot.can_send = snapshot.balance > 0;
        }
        Ok(())
    }

    /// Drop the cached snapshot (on logout)
    pub fn clear(&self) {
        *acquire_write_lock(&self.snapshot) = None;
    }

    /// Local send gate for the given live balance
    pub fn gate(&self, balance: i64) -> BudgetCheck {
        limits::check_send(acquire_read_lock(&self.snapshot).as_ref(), balance)
    }

    pub fn status(&self, balance: i64) -> BudgetStatus {
        limits::status(acquire_read_lock(&self.snapshot).as_ref(), balance)
    }

    /// Start editing the settings from the cached snapshot
    pub fn draft(&self, balance: i64) -> BudgetDraft {
        BudgetDraft::new(acquire_read_lock(&self.snapshot).as_ref(), balance)
    }

    fn store(&self, snapshot: BudgetSnapshot) {
        let balance = snapshot.balance;
        *acquire_write_lock(&self.snapshot) = Some(snapshot);
        self.session.update_user(UserPatch::balance(balance));
    }
}

/// Unsaved budget settings being edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetDraft {
    period: BudgetPeriod,
    coins: i64,
    balance: i64,
}

impl BudgetDraft {
    pub fn new(snapshot: Option<&BudgetSnapshot>, balance: i64) -> Self {
        let period = snapshot.map(|s| s.budget_period).unwrap_or_default();
        let coins = match snapshot {
            Some(s) if s.budget_coins > 0 => s.budget_coins,
            _ => balance.max(0),
        };
        Self {
            period,
            coins,
            balance: balance.max(0),
        }
    }

    pub fn period(&self) -> BudgetPeriod {
        self.period
    }

    pub fn coins(&self) -> i64 {
        self.coins
    }

    /// Selecting a period pre-fills an empty allotment with the balance
    pub fn select_period(&mut self, period: BudgetPeriod) {
        self.period = period;
        if self.coins == 0 {
            self.coins = self.balance;
        }
    }

    /// Clamped to `[0, balance]`
    pub fn set_coins(&mut self, coins: i64) {
        self.coins = coins.clamp(0, self.balance);
    }

    pub fn preview_daily_limit(&self) -> i64 {
        limits::preview_daily_limit(self.period, self.coins)
    }

    /// Settings to submit; `none` always carries 0 coins
    pub fn settings(&self) -> BudgetSettings {
        BudgetSettings {
            period: self.period,
            coins: if self.period.is_none() { 0 } else { self.coins },
        }
    }
}
