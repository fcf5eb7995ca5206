//! Budget data types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Window over which a coin allotment is spread into a daily limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Week,
    TwoWeeks,
    ThreeWeeks,
    Month,
    /// No daily limit, the gate is balance-only. Unknown periods land here.
    #[default]
    #[serde(other)]
    None,
}

impl BudgetPeriod {
    pub const ALL: [BudgetPeriod; 5] = [
        Self::None,
        Self::Week,
        Self::TwoWeeks,
        Self::ThreeWeeks,
        Self::Month,
    ];

    /// Number of days the allotment is spread over; 0 for `None`
    pub fn days(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Week => 7,
            Self::TwoWeeks => 14,
            Self::ThreeWeeks => 21,
            Self::Month => 30,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Week => "week",
            Self::TwoWeeks => "two_weeks",
            Self::ThreeWeeks => "three_weeks",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|period| period.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "Unknown budget period '{}'. Expected one of: none, week, two_weeks, three_weeks, month",
                    s
                )
            })
    }
}

/// Budget numbers as computed by the server (`GET /budget`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    #[serde(default)]
    pub budget_period: BudgetPeriod,
    #[serde(default)]
    pub budget_coins: i64,
    #[serde(default)]
    pub daily_limit: i64,
    #[serde(default)]
    pub daily_spent: i64,
    #[serde(default)]
    pub daily_remaining: i64,
    #[serde(default)]
    pub period_days: i64,
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub can_send: bool,
    #[serde(default)]
    pub message: String,
}

/// `POST /budget` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSettings {
    pub period: BudgetPeriod,
    pub coins: i64,
}

/// Reason the local send gate refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
pub enum BudgetDenialReason {
    #[serde(rename = "noBalance")]
    NoBalance,
    #[serde(rename = "dailyLimitReached")]
    DailyLimitReached { limit: i64, spent: i64 },
}

impl fmt::Display for BudgetDenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBalance => write!(f, "Not enough coins. Please top up your balance."),
            Self::DailyLimitReached { limit, spent } => write!(
                f,
                "Daily limit reached ({}/{} coins spent). Try again tomorrow or change the budget.",
                spent, limit
            ),
        }
    }
}

/// Result of the local send gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
pub enum BudgetCheck {
    /// `daily_remaining` is `None` when no daily limit applies
    #[serde(rename = "allowed")]
    Allowed { daily_remaining: Option<i64> },
    #[serde(rename = "denied")]
    Denied { reason: BudgetDenialReason },
}

impl BudgetCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn denial_reason(&self) -> Option<&BudgetDenialReason> {
        match self {
            Self::Denied { reason } => Some(reason),
            _ => None,
        }
    }
}

/// What the UI shows next to the balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub period: BudgetPeriod,
    pub daily_limit: i64,
    pub daily_spent: i64,
    pub daily_remaining: i64,
    pub has_budget_limit: bool,
    pub can_send: bool,
    pub block_reason: Option<String>,
}
