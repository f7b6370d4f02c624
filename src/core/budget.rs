//! Budget envelopes: lifecycle and budget-scoped spending.
//!
//! Spending against a budget never overdraws it silently. When an expense is
//! larger than the quota left this month, the caller gets an
//! [`ExpensePlan::Overage`] describing the split and has to confirm it
//! through [`apply_overage_split`]: the part that fits goes to the budget,
//! the rest becomes a daily expense tagged with the budget's name.

use crate::core::aggregate::remaining_quota;
use crate::core::state::{Amount, AppState, Budget, Transaction};
use crate::core::validation::{non_negative_amount, positive_amount, required_text};
use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fields for a new budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBudget {
    /// Display name
    pub name: String,
    /// Monthly quota
    pub total_budget: Amount,
    /// Icon, defaulted when absent
    pub icon: Option<String>,
    /// Color, defaulted when absent
    pub color: Option<String>,
    /// Archive automatically at month close
    pub is_temporary: bool,
}

/// Partial update of a budget; `None` leaves the field as it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetChanges {
    /// New name
    pub name: Option<String>,
    /// New quota
    pub total_budget: Option<Amount>,
    /// New icon
    pub icon: Option<String>,
    /// New color
    pub color: Option<String>,
    /// New temporary flag
    pub is_temporary: Option<bool>,
}

/// How an expense would land on a budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ExpensePlan {
    /// The whole amount fits in the remaining quota
    Within {
        /// Amount recorded on the budget
        amount: Amount,
    },
    /// The amount exceeds the remaining quota and must be split
    Overage(OverageSplit),
}

/// The split applied to an expense that exceeds the remaining quota.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverageSplit {
    /// Target budget
    pub budget_id: i64,
    /// Target budget's name, used as `source_category`
    pub budget_name: String,
    /// Portion recorded on the budget (zero when the quota is used up)
    pub to_budget: Amount,
    /// Portion recorded as a daily expense
    pub to_daily: Amount,
}

fn find_budget(state: &AppState, id: i64) -> Result<&Budget> {
    state.budget(id).ok_or(Error::BudgetNotFound { id })
}

fn find_active_budget(state: &AppState, id: i64) -> Result<&Budget> {
    let budget = find_budget(state, id)?;
    if budget.is_archived {
        return Err(Error::Validation {
            message: format!("budget '{}' is archived", budget.name),
        });
    }
    Ok(budget)
}

/// Creates a budget at the end of the display order and returns its id.
pub fn create_budget(state: &mut AppState, new: NewBudget) -> Result<i64> {
    let name = required_text("Budget name", &new.name)?;
    let total_budget = non_negative_amount(new.total_budget)?;

    let id = state.next_budget_id();
    let order = state.budgets.iter().map(|b| b.order).max().map_or(0, |o| o + 1);
    let defaults = Budget::default();
    state.budgets.push(Budget {
        id,
        name,
        total_budget,
        icon: new.icon.unwrap_or(defaults.icon),
        color: new.color.unwrap_or(defaults.color),
        order,
        is_temporary: new.is_temporary,
        ..Budget::default()
    });
    debug!("Created budget {id}");
    Ok(id)
}

/// Applies a partial update to a budget.
pub fn update_budget(state: &mut AppState, id: i64, changes: BudgetChanges) -> Result<()> {
    find_budget(state, id)?;
    let name = changes
        .name
        .as_deref()
        .map(|n| required_text("Budget name", n))
        .transpose()?;
    let total_budget = changes.total_budget.map(non_negative_amount).transpose()?;

    let Some(budget) = state.budget_mut(id) else {
        return Err(Error::BudgetNotFound { id });
    };
    if let Some(name) = name {
        budget.name = name;
    }
    if let Some(total) = total_budget {
        budget.total_budget = total;
    }
    if let Some(icon) = changes.icon {
        budget.icon = icon;
    }
    if let Some(color) = changes.color {
        budget.color = color;
    }
    if let Some(is_temporary) = changes.is_temporary {
        budget.is_temporary = is_temporary;
    }
    Ok(())
}

/// Reassigns display order. Budgets listed come first in the given order;
/// unlisted budgets keep their relative order after them.
pub fn reorder_budgets(state: &mut AppState, ordered_ids: &[i64]) -> Result<()> {
    for id in ordered_ids {
        find_budget(state, *id)?;
    }
    let mut sorted: Vec<&mut Budget> = state.budgets.iter_mut().collect();
    sorted.sort_by_key(|b| {
        (
            ordered_ids
                .iter()
                .position(|id| *id == b.id)
                .unwrap_or(usize::MAX),
            b.order,
        )
    });
    for (order, budget) in (0_i64..).zip(sorted) {
        budget.order = order;
    }
    Ok(())
}

/// Soft-archives or restores a budget. History is kept either way.
pub fn set_archived(state: &mut AppState, id: i64, archived: bool) -> Result<()> {
    let budget = state.budget_mut(id).ok_or(Error::BudgetNotFound { id })?;
    budget.is_archived = archived;
    Ok(())
}

/// Permanently removes a budget and its history.
pub fn delete_budget(state: &mut AppState, id: i64) -> Result<()> {
    find_budget(state, id)?;
    state.budgets.retain(|b| b.id != id);
    Ok(())
}

/// Works out how an expense would be recorded, without recording it.
pub fn plan_budget_expense(
    state: &AppState,
    budget_id: i64,
    amount: f64,
    as_of: DateTime<FixedOffset>,
) -> Result<ExpensePlan> {
    let amount = positive_amount(amount)?;
    let budget = find_active_budget(state, budget_id)?;
    let remaining = remaining_quota(budget, as_of).max(0.0);

    if amount <= remaining {
        return Ok(ExpensePlan::Within { amount });
    }
    Ok(ExpensePlan::Overage(OverageSplit {
        budget_id,
        budget_name: budget.name.clone(),
        to_budget: remaining,
        to_daily: amount - remaining,
    }))
}

fn push_budget_entry(
    state: &mut AppState,
    budget_id: i64,
    desc: String,
    amount: Amount,
    as_of: DateTime<FixedOffset>,
) -> Result<()> {
    let budget = state
        .budget_mut(budget_id)
        .ok_or(Error::BudgetNotFound { id: budget_id })?;
    budget.history.push(Transaction {
        desc,
        amount,
        timestamp: as_of.to_utc(),
        source_category: None,
    });
    Ok(())
}

/// Records an expense that fits the remaining quota.
///
/// # Errors
/// Returns [`Error::OverageRequiresConfirmation`] when it does not fit; the
/// caller must confirm and use [`apply_overage_split`].
pub fn add_budget_expense(
    state: &mut AppState,
    budget_id: i64,
    desc: &str,
    amount: f64,
    as_of: DateTime<FixedOffset>,
) -> Result<()> {
    let desc = required_text("Description", desc)?;
    match plan_budget_expense(state, budget_id, amount, as_of)? {
        ExpensePlan::Within { amount } => push_budget_entry(state, budget_id, desc, amount, as_of),
        ExpensePlan::Overage(split) => Err(Error::OverageRequiresConfirmation {
            budget: split.budget_name,
            amount,
            remaining: split.to_budget,
        }),
    }
}

/// Records a confirmed expense, splitting it when it exceeds the quota.
/// Nothing is written to the budget when its quota is already used up.
pub fn apply_overage_split(
    state: &mut AppState,
    budget_id: i64,
    desc: &str,
    amount: f64,
    as_of: DateTime<FixedOffset>,
) -> Result<ExpensePlan> {
    let desc = required_text("Description", desc)?;
    let plan = plan_budget_expense(state, budget_id, amount, as_of)?;
    match &plan {
        ExpensePlan::Within { amount } => {
            push_budget_entry(state, budget_id, desc, *amount, as_of)?;
        }
        ExpensePlan::Overage(split) => {
            if split.to_budget > 0.0 {
                push_budget_entry(state, budget_id, desc.clone(), split.to_budget, as_of)?;
            }
            state.daily_expenses.push(Transaction {
                desc,
                amount: split.to_daily,
                timestamp: as_of.to_utc(),
                source_category: Some(split.budget_name.clone()),
            });
            debug!(
                "Split overage on budget {budget_id}: {} to budget, {} to daily",
                split.to_budget, split.to_daily
            );
        }
    }
    Ok(plan)
}
