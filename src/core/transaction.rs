//! Fund-history and daily-expense entries, plus editing and deleting any
//! recorded transaction by its location.

use crate::core::state::{Amount, AppState, FundKind, FundTransaction, Transaction};
use crate::core::validation::{positive_amount, required_text};
use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Where a transaction lives. Indices are positions in the append-ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "list")]
pub enum TxLocation {
    /// An entry in a budget's history
    #[serde(rename_all = "camelCase")]
    Budget {
        /// Budget id
        budget_id: i64,
        /// Position in the history
        index: usize,
    },
    /// An entry in the daily-expense list
    Daily {
        /// Position in the list
        index: usize,
    },
    /// An entry in the fund history
    Fund {
        /// Position in the list
        index: usize,
    },
}

impl std::fmt::Display for TxLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Budget { budget_id, index } => write!(f, "budget {budget_id} #{index}"),
            Self::Daily { index } => write!(f, "daily #{index}"),
            Self::Fund { index } => write!(f, "fund #{index}"),
        }
    }
}

fn push_fund(
    state: &mut AppState,
    kind: FundKind,
    desc: &str,
    amount: f64,
    as_of: DateTime<FixedOffset>,
) -> Result<()> {
    let desc = required_text("Description", desc)?;
    let amount = positive_amount(amount)?;
    state.fund_history.push(FundTransaction {
        kind,
        desc,
        amount,
        timestamp: as_of.to_utc(),
    });
    Ok(())
}

/// Records income.
pub fn add_income(state: &mut AppState, desc: &str, amount: f64, as_of: DateTime<FixedOffset>) -> Result<()> {
    push_fund(state, FundKind::Add, desc, amount, as_of)
}

/// Records a general outflow not tied to a budget.
pub fn add_general_expense(
    state: &mut AppState,
    desc: &str,
    amount: f64,
    as_of: DateTime<FixedOffset>,
) -> Result<()> {
    push_fund(state, FundKind::Remove, desc, amount, as_of)
}

/// Records an untracked daily expense.
pub fn add_daily_expense(
    state: &mut AppState,
    desc: &str,
    amount: f64,
    source_category: Option<String>,
    as_of: DateTime<FixedOffset>,
) -> Result<()> {
    let desc = required_text("Description", desc)?;
    let amount = positive_amount(amount)?;
    state.daily_expenses.push(Transaction {
        desc,
        amount,
        timestamp: as_of.to_utc(),
        source_category,
    });
    Ok(())
}

fn not_found(location: TxLocation) -> Error {
    Error::TransactionNotFound {
        location: location.to_string(),
    }
}

/// Borrows the description and amount of the entry at `location`.
fn entry_mut(state: &mut AppState, location: TxLocation) -> Result<(&mut String, &mut Amount)> {
    match location {
        TxLocation::Budget { budget_id, index } => {
            let budget = state
                .budget_mut(budget_id)
                .ok_or(Error::BudgetNotFound { id: budget_id })?;
            budget
                .history
                .get_mut(index)
                .map(|t| (&mut t.desc, &mut t.amount))
                .ok_or_else(|| not_found(location))
        }
        TxLocation::Daily { index } => state
            .daily_expenses
            .get_mut(index)
            .map(|t| (&mut t.desc, &mut t.amount))
            .ok_or_else(|| not_found(location)),
        TxLocation::Fund { index } => state
            .fund_history
            .get_mut(index)
            .map(|t| (&mut t.desc, &mut t.amount))
            .ok_or_else(|| not_found(location)),
    }
}

/// Changes the description and/or amount of a recorded transaction. The
/// timestamp and the owning collection never change.
pub fn edit_transaction(
    state: &mut AppState,
    location: TxLocation,
    desc: Option<&str>,
    amount: Option<f64>,
) -> Result<()> {
    let desc = desc.map(|d| required_text("Description", d)).transpose()?;
    let amount = amount.map(positive_amount).transpose()?;

    let (current_desc, current_amount) = entry_mut(state, location)?;
    if let Some(desc) = desc {
        *current_desc = desc;
    }
    if let Some(amount) = amount {
        *current_amount = amount;
    }
    Ok(())
}

/// Removes a recorded transaction.
pub fn delete_transaction(state: &mut AppState, location: TxLocation) -> Result<()> {
    // Existence check first so a bad index never shifts anything.
    entry_mut(state, location)?;
    match location {
        TxLocation::Budget { budget_id, index } => {
            if let Some(budget) = state.budget_mut(budget_id) {
                budget.history.remove(index);
            }
        }
        TxLocation::Daily { index } => {
            state.daily_expenses.remove(index);
        }
        TxLocation::Fund { index } => {
            state.fund_history.remove(index);
        }
    }
    Ok(())
}
