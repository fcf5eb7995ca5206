//! Self-imposed spending budget
//!
//! - Pure policy: daily limit, remaining allowance, send gate
//! - Cached server snapshot and the settings draft

mod budget;
pub mod limits;
mod types;

pub use budget::{BudgetDraft, BudgetTracker};
pub use types::{
    BudgetCheck, BudgetDenialReason, BudgetPeriod, BudgetSettings, BudgetSnapshot, BudgetStatus,
};
