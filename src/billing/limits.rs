//! Budget policy
//!
//! Pure functions over server-reported numbers. These only drive the local
//! send gate and the settings preview; the server enforces the real limit.

use super::types::{BudgetCheck, BudgetDenialReason, BudgetPeriod, BudgetSnapshot, BudgetStatus};

/// `floor(coins / days)`, 0 when the period has no days
pub fn daily_limit(period: BudgetPeriod, coins: i64) -> i64 {
    let days = period.days();
    if days > 0 {
        coins.max(0) / days
    } else {
        0
    }
}

/// Never negative
pub fn daily_remaining(limit: i64, spent: i64) -> i64 {
    (limit - spent).max(0)
}

/// A configured period with a zero allotment locks sending even with a
/// positive balance.
pub fn can_send(period: BudgetPeriod, balance: i64, daily_remaining: i64) -> bool {
    if period.is_none() {
        balance > 0
    } else {
        daily_remaining > 0 && balance > 0
    }
}

/// Daily limit for a budget that is being edited and not saved yet
pub fn preview_daily_limit(period: BudgetPeriod, candidate_coins: i64) -> i64 {
    daily_limit(period, candidate_coins)
}

/// Evaluate the send gate.
///
/// `balance` comes from the live user profile, which is patched after every
/// send. The snapshot supplies the period, allotment and spend; without one
/// the gate is balance-only.
pub fn check_send(snapshot: Option<&BudgetSnapshot>, balance: i64) -> BudgetCheck {
    let (period, coins, spent) = match snapshot {
        Some(s) => (s.budget_period, s.budget_coins, s.daily_spent),
        None => (BudgetPeriod::None, 0, 0),
    };
    let limit = daily_limit(period, coins);
    let remaining = daily_remaining(limit, spent);

    if can_send(period, balance, remaining) {
        return BudgetCheck::Allowed {
            daily_remaining: (!period.is_none()).then_some(remaining),
        };
    }

    let reason = if balance <= 0 {
        BudgetDenialReason::NoBalance
    } else {
        BudgetDenialReason::DailyLimitReached {
            limit,
            spent,
        }
    };
    BudgetCheck::Denied { reason }
}

/// Status line for the UI
pub fn status(snapshot: Option<&BudgetSnapshot>, balance: i64) -> BudgetStatus {
    let check = check_send(snapshot, balance);
    let period = snapshot.map(|s| s.budget_period).unwrap_or_default();
    let limit = snapshot.map_or(0, |s| daily_limit(s.budget_period, s.budget_coins));
    let spent = snapshot.map_or(0, |s| s.daily_spent);
    let remaining = if period.is_none() {
        balance.max(0)
    } else {
        daily_remaining(limit, spent)
    };

    BudgetStatus {
        period,
        daily_limit: limit,
        daily_spent: spent,
        daily_remaining: remaining,
        has_budget_limit: !period.is_none() && limit > 0,
        can_send: check.is_allowed(),
        block_reason: check.denial_reason().map(ToString::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(period: BudgetPeriod, coins: i64, spent: i64) -> BudgetSnapshot {
        BudgetSnapshot {
            budget_period: period,
            budget_coins: coins,
            daily_spent: spent,
            ..Default::default()
        }
    }

    #[test]
    fn test_daily_limit_is_floor_division() {
        for period in BudgetPeriod::ALL.into_iter().filter(|p| !p.is_none()) {
            for coins in [0, 1, 6, 7, 99, 700, 1000, 12345] {
                assert_eq!(daily_limit(period, coins), coins / period.days());
            }
            assert_eq!(daily_limit(period, 0), 0);
        }
        assert_eq!(daily_limit(BudgetPeriod::None, 5000), 0);
    }

    #[test]
    fn test_daily_remaining_clamps() {
        assert_eq!(daily_remaining(100, 30), 70);
        assert_eq!(daily_remaining(100, 150), 0);
    }

    #[test]
    fn test_none_period_gate_is_balance_only() {
        for balance in [-5, 0, 1, 1000] {
            for remaining in [0, 10] {
                assert_eq!(can_send(BudgetPeriod::None, balance, remaining), balance > 0);
            }
        }
    }

    #[test]
    fn test_week_with_nothing_remaining_blocks() {
        assert!(!can_send(BudgetPeriod::Week, 500, 0));
        assert!(can_send(BudgetPeriod::Week, 500, 1));
    }

    #[test]
    fn test_zeroed_budget_is_a_lockout() {
        let check = check_send(Some(&snapshot(BudgetPeriod::Month, 0, 0)), 1000);
        assert_eq!(
            check.denial_reason(),
            Some(&BudgetDenialReason::DailyLimitReached { limit: 0, spent: 0 })
        );
    }

    #[test]
    fn test_week_budget_scenario() {
        let s = snapshot(BudgetPeriod::Week, 700, 0);
        assert_eq!(daily_limit(s.budget_period, s.budget_coins), 100);
        assert_eq!(
            check_send(Some(&s), 1000),
            BudgetCheck::Allowed { daily_remaining: Some(100) }
        );

        let s = snapshot(BudgetPeriod::Week, 700, 100);
        let check = check_send(Some(&s), 1000);
        assert!(!check.is_allowed());

        let view = status(Some(&s), 1000);
        assert_eq!(view.daily_remaining, 0);
        assert!(view.has_budget_limit);
        assert!(!view.can_send);
        assert!(view.block_reason.is_some());
    }

    #[test]
    fn test_no_snapshot_uses_balance() {
        assert_eq!(
            check_send(None, 10),
            BudgetCheck::Allowed { daily_remaining: None }
        );
        assert_eq!(
            check_send(None, 0).denial_reason(),
            Some(&BudgetDenialReason::NoBalance)
        );
        let view = status(None, 10);
        assert!(!view.has_budget_limit);
        assert_eq!(view.daily_remaining, 10);
    }

    #[test]
    fn test_preview_matches_daily_limit() {
        assert_eq!(preview_daily_limit(BudgetPeriod::TwoWeeks, 1400), 100);
        assert_eq!(preview_daily_limit(BudgetPeriod::None, 1400), 0);
    }
}
