//! Budget commands

use crate::app::AppState;
use crate::billing::{BudgetPeriod, BudgetStatus};

fn render(status: &BudgetStatus, balance: i64) -> String {
    let mut lines = vec![format!("Balance: {}", balance)];
    if status.has_budget_limit {
        lines.push(format!("Budget:  {} ({} per day)", status.period, status.daily_limit));
        lines.push(format!(
            "Today:   {}/{} remaining",
            status.daily_remaining, status.daily_limit
        ));
    } else {
        lines.push("Budget:  no daily limit".to_string());
    }
    if let Some(reason) = &status.block_reason {
        lines.push(format!("Blocked: {}", reason));
    }
    lines.join("\n")
}

/// Refreshes first; a failed refresh falls back to the cached numbers
pub async fn show_budget(state: &AppState) -> String {
    let note = match state.budget.refresh().await {
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    };
    let balance = state.session.balance();
    let mut text = render(&state.budget.status(balance), balance);
    if let Some(note) = note {
        text.push_str(&format!("\n({})", note));
    }
    text
}

pub async fn set_budget(
    state: &AppState,
    period: BudgetPeriod,
    coins: i64,
) -> Result<String, String> {
    let mut draft = state.budget.draft(state.session.balance());
    draft.select_period(period);
    if !period.is_none() {
        draft.set_coins(coins);
    }
    let preview = draft.preview_daily_limit();
    state
        .budget
        .save(draft.settings())
        .await
        .map_err(|e| e.to_string())?;
    let balance = state.session.balance();
    Ok(format!(
        "Budget saved ({} per day)\n{}",
        preview,
        render(&state.budget.status(balance), balance)
    ))
}

pub async fn disable_budget(state: &AppState) -> Result<String, String> {
    state.budget.disable().await.map_err(|e| e.to_string())?;
    Ok("Daily budget disabled".to_string())
}
