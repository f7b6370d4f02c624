//! Savings goals.
//!
//! Every contribution and withdrawal is mirrored into the fund history so the
//! money moves symmetrically between the goal and the month's balance.

use crate::core::aggregate::summarize;
use crate::core::state::{
    AppState, FundKind, FundTransaction, SavingKind, SavingTransaction, SavingsGoal,
};
use crate::core::streaks::record_saving;
use crate::core::validation::{positive_amount, required_text};
use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Input for a new savings goal. `target_amount: None` makes it open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    /// Display name
    pub name: String,
    /// Target, absent for an infinite goal
    pub target_amount: Option<f64>,
}

fn goal_name(state: &AppState, goal_id: i64) -> Result<String> {
    state
        .savings_goals
        .iter()
        .find(|g| g.id == goal_id)
        .map(|g| g.name.clone())
        .ok_or(Error::GoalNotFound { id: goal_id })
}

/// Creates a goal and returns its id.
pub fn create_goal(state: &mut AppState, goal: NewGoal, as_of: DateTime<FixedOffset>) -> Result<i64> {
    let name = required_text("Goal name", &goal.name)?;
    let target_amount = goal.target_amount.map(positive_amount).transpose()?;
    let id = state.next_goal_id();
    state.savings_goals.push(SavingsGoal {
        id,
        name,
        target_amount,
        is_infinite: target_amount.is_none(),
        saved_amount: 0.0,
        history: Vec::new(),
        is_completed: false,
        created_at: as_of.to_utc(),
    });
    Ok(id)
}

/// Moves money from the month's available funds into a goal.
pub fn add_saving(
    state: &mut AppState,
    goal_id: i64,
    amount: f64,
    as_of: DateTime<FixedOffset>,
) -> Result<()> {
    let amount = positive_amount(amount)?;
    let name = goal_name(state, goal_id)?;
    let available = summarize(state, as_of).current_available_funds;
    if amount > available {
        return Err(Error::InsufficientFunds {
            available,
            required: amount,
        });
    }

    if let Some(goal) = state.goal_mut(goal_id) {
        goal.history.push(SavingTransaction {
            kind: SavingKind::Add,
            amount,
            timestamp: as_of.to_utc(),
        });
        goal.recompute();
    }
    state.fund_history.push(FundTransaction {
        kind: FundKind::Remove,
        desc: format!("Savings: {name}"),
        amount,
        timestamp: as_of.to_utc(),
    });
    record_saving(&mut state.achievement_data, as_of.date_naive());
    debug!("Saved {} into goal {}", amount, goal_id);
    Ok(())
}

/// Moves money out of a goal back into the fund.
pub fn withdraw_saving(
    state: &mut AppState,
    goal_id: i64,
    amount: f64,
    as_of: DateTime<FixedOffset>,
) -> Result<()> {
    let amount = positive_amount(amount)?;
    let goal = state
        .goal_mut(goal_id)
        .ok_or(Error::GoalNotFound { id: goal_id })?;
    if amount > goal.saved_amount {
        return Err(Error::InsufficientFunds {
            available: goal.saved_amount,
            required: amount,
        });
    }
    goal.history.push(SavingTransaction {
        kind: SavingKind::Withdraw,
        amount,
        timestamp: as_of.to_utc(),
    });
    goal.recompute();
    let desc = format!("Withdraw: {}", goal.name);
    state.fund_history.push(FundTransaction {
        kind: FundKind::Add,
        desc,
        amount,
        timestamp: as_of.to_utc(),
    });
    Ok(())
}

/// Deletes a goal. With `refund` the remaining balance flows back into the
/// fund; otherwise it leaves the ledger with the goal.
pub fn delete_goal(
    state: &mut AppState,
    goal_id: i64,
    refund: bool,
    as_of: DateTime<FixedOffset>,
) -> Result<()> {
    let position = state
        .savings_goals
        .iter()
        .position(|g| g.id == goal_id)
        .ok_or(Error::GoalNotFound { id: goal_id })?;
    let goal = state.savings_goals.remove(position);
    if refund && goal.saved_amount > 0.0 {
        state.fund_history.push(FundTransaction {
            kind: FundKind::Add,
            desc: format!("Refund: {}", goal.name),
            amount: goal.saved_amount,
            timestamp: as_of.to_utc(),
        });
    }
    Ok(())
}
