//! Aggregate Calculator - month-scoped totals derived from the Ledger Store.
//!
//! Stateless and recomputed on demand. Budget usage is always a filtered
//! reduction over the budget's history, never a stored counter, so nothing
//! here needs resetting at month end.

use crate::core::period::{is_current_month, is_today, remaining_days_in_month};
use crate::core::state::{Amount, AppState, Budget, DebtKind, FundKind};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// Derived totals for the month containing `as_of`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// Fund adds in the month
    pub monthly_income: Amount,
    /// Fund removes in the month
    pub monthly_general_expense: Amount,
    /// Budget history entries in the month
    pub total_used_from_posts: Amount,
    /// Daily-expense entries in the month
    pub total_daily_spent: Amount,
    /// Sum of the three expense aggregates
    pub total_used_overall: Amount,
    /// `monthly_income - total_used_overall`
    pub total_remaining: Amount,
    /// Quotas of non-archived budgets, not month-filtered
    pub total_allocated: Amount,
    /// `monthly_income - total_allocated`
    pub unallocated_funds: Amount,
    /// Unallocated money still spendable, clamped to `total_remaining`
    pub current_available_funds: Amount,
    /// `current_available_funds / remaining days (inclusive)`
    pub daily_quota: Amount,
    /// Days left in the month, today included
    pub remaining_days: u32,
}

/// Computes the monthly summary.
///
/// Only entries in the calendar month containing `as_of`, on the user's wall
/// clock, count toward income and spending. Available funds are clamped to
/// the month's remaining money, and the daily quota spreads them over the
/// days left, today included.
///
/// # Arguments
///
/// * `state` - The snapshot to summarize
/// * `as_of` - The user's wall-clock instant
///
/// # Returns
///
/// A `MonthlySummary`. The state is not modified.
#[must_use]
pub fn summarize(state: &AppState, as_of: DateTime<FixedOffset>) -> MonthlySummary {
    let in_window = |ts: DateTime<Utc>| is_current_month(ts, as_of);

    let (mut monthly_income, mut monthly_general_expense) = (0.0, 0.0);
    for tx in state.fund_history.iter().filter(|t| in_window(t.timestamp)) {
        match tx.kind {
            FundKind::Add => monthly_income += tx.amount,
            FundKind::Remove => monthly_general_expense += tx.amount,
        }
    }

    let total_used_from_posts: Amount = state
        .budgets
        .iter()
        .map(|b| used_this_month(b, as_of))
        .sum();

    let total_daily_spent: Amount = state
        .daily_expenses
        .iter()
        .filter(|t| in_window(t.timestamp))
        .map(|t| t.amount)
        .sum();

    let total_used_overall = monthly_general_expense + total_used_from_posts + total_daily_spent;
    let total_remaining = monthly_income - total_used_overall;
    let total_allocated: Amount = state.active_budgets().map(|b| b.total_budget).sum();
    let unallocated_funds = monthly_income - total_allocated;

    // Never show spendable money while the month is cash-negative overall.
    let current_available_funds =
        (unallocated_funds - monthly_general_expense - total_daily_spent).min(total_remaining);

    let remaining_days = remaining_days_in_month(as_of);

    MonthlySummary {
        monthly_income,
        monthly_general_expense,
        total_used_from_posts,
        total_daily_spent,
        total_used_overall,
        total_remaining,
        total_allocated,
        unallocated_funds,
        current_available_funds,
        daily_quota: current_available_funds / f64::from(remaining_days),
        remaining_days,
    }
}

/// Sum of the budget's history entries in the month of `as_of`.
#[must_use]
pub fn used_this_month(budget: &Budget, as_of: DateTime<FixedOffset>) -> Amount {
    budget
        .history
        .iter()
        .filter(|t| is_current_month(t.timestamp, as_of))
        .map(|t| t.amount)
        .sum()
}

/// Quota left on the budget this month; negative once overspent.
#[must_use]
pub fn remaining_quota(budget: &Budget, as_of: DateTime<FixedOffset>) -> Amount {
    budget.total_budget - used_this_month(budget, as_of)
}

/// Everything spent on the calendar day of `as_of`, across budgets, daily
/// expenses and general fund outflows.
#[must_use]
pub fn spent_today(state: &AppState, as_of: DateTime<FixedOffset>) -> Amount {
    let posts: Amount = state
        .budgets
        .iter()
        .flat_map(|b| b.history.iter())
        .filter(|t| is_today(t.timestamp, as_of))
        .map(|t| t.amount)
        .sum();
    let daily: Amount = state
        .daily_expenses
        .iter()
        .filter(|t| is_today(t.timestamp, as_of))
        .map(|t| t.amount)
        .sum();
    let general: Amount = state
        .fund_history
        .iter()
        .filter(|t| t.kind == FundKind::Remove && is_today(t.timestamp, as_of))
        .map(|t| t.amount)
        .sum();
    posts + daily + general
}

/// Month balance plus savings, assets and open debts.
#[must_use]
pub fn net_worth(state: &AppState, summary: &MonthlySummary) -> Amount {
    let savings: Amount = state.savings_goals.iter().map(|g| g.saved_amount).sum();
    let assets: Amount = state.assets.iter().map(|a| a.value).sum();
    let debts: Amount = state
        .debts
        .iter()
        .map(|d| match d.kind {
            DebtKind::Lent => d.outstanding(),
            DebtKind::Borrowed => -d.outstanding(),
        })
        .sum();
    summary.total_remaining + savings + assets + debts
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::state::{Asset, Debt, FundTransaction, SavingsGoal, Transaction};
    use crate::test_utils::{at, budget_with, income};

    #[test]
    fn test_summary_of_empty_state() {
        let summary = summarize(&AppState::default(), at(2025, 3, 1, 9));
        assert_eq!(summary.total_remaining, 0.0);
        assert_eq!(summary.current_available_funds, 0.0);
        assert_eq!(summary.remaining_days, 31);
    }

    #[test]
    fn test_only_current_month_counts() {
        let now = at(2025, 3, 15, 9);
        let mut state = AppState::default();
        state.fund_history.push(income(1_000.0, at(2025, 3, 1, 9)));
        state.fund_history.push(income(5_000.0, at(2025, 2, 27, 9)));
        let mut food = budget_with(1, "Food", 300.0);
        food.history.push(Transaction {
            desc: "old".to_string(),
            amount: 250.0,
            timestamp: at(2025, 2, 20, 9).to_utc(),
            source_category: None,
        });
        food.history.push(Transaction {
            desc: "new".to_string(),
            amount: 100.0,
            timestamp: at(2025, 3, 2, 9).to_utc(),
            source_category: None,
        });
        state.budgets.push(food);

        let summary = summarize(&state, now);
        assert_eq!(summary.monthly_income, 1_000.0);
        assert_eq!(summary.total_used_from_posts, 100.0);
        assert_eq!(summary.total_allocated, 300.0);
        assert_eq!(summary.total_remaining, 900.0);
        assert_eq!(used_this_month(&state.budgets[0], now), 100.0);
        assert_eq!(remaining_quota(&state.budgets[0], now), 200.0);
    }

    #[test]
    fn test_archived_budgets_are_not_allocated() {
        let now = at(2025, 3, 15, 9);
        let mut state = AppState::default();
        state.budgets.push(budget_with(1, "Food", 300.0));
        let mut old = budget_with(2, "Trip", 700.0);
        old.is_archived = true;
        state.budgets.push(old);
        assert_eq!(summarize(&state, now).total_allocated, 300.0);
    }

    #[test]
    fn test_available_funds_clamped_by_remaining() {
        // Budget overspend makes total_remaining negative while the
        // unclamped formula would still report money left.
        let now = at(2025, 3, 15, 9);
        let mut state = AppState::default();
        state.fund_history.push(income(1_000.0, now));
        let mut food = budget_with(1, "Food", 200.0);
        food.history.push(Transaction {
            desc: "feast".to_string(),
            amount: 1_500.0,
            timestamp: now.to_utc(),
            source_category: None,
        });
        state.budgets.push(food);

        let summary = summarize(&state, now);
        assert_eq!(summary.unallocated_funds, 800.0);
        assert_eq!(summary.total_remaining, -500.0);
        assert_eq!(summary.current_available_funds, -500.0);
        assert!(summary.daily_quota < 0.0);
    }

    #[test]
    fn test_daily_quota_divides_by_remaining_days() {
        let now = at(2025, 4, 21, 9); // 10 days left in April
        let mut state = AppState::default();
        state.fund_history.push(income(1_000.0, now));
        let summary = summarize(&state, now);
        assert_eq!(summary.remaining_days, 10);
        assert_eq!(summary.daily_quota, 100.0);
    }

    #[test]
    fn test_spent_today_spans_collections() {
        let now = at(2025, 4, 21, 18);
        let mut state = AppState::default();
        state.fund_history.push(FundTransaction {
            kind: FundKind::Remove,
            desc: "Parking".to_string(),
            amount: 5.0,
            timestamp: at(2025, 4, 21, 8).to_utc(),
        });
        state.daily_expenses.push(Transaction {
            desc: "Coffee".to_string(),
            amount: 3.0,
            timestamp: at(2025, 4, 21, 9).to_utc(),
            source_category: None,
        });
        state.daily_expenses.push(Transaction {
            desc: "Yesterday".to_string(),
            amount: 50.0,
            timestamp: at(2025, 4, 20, 9).to_utc(),
            source_category: None,
        });
        assert_eq!(spent_today(&state, now), 8.0);
    }

    #[test]
    fn test_net_worth_counts_savings_assets_and_debts() {
        let now = at(2025, 4, 21, 9);
        let mut state = AppState::default();
        state.fund_history.push(income(1_000.0, now));
        state.savings_goals.push(SavingsGoal {
            saved_amount: 200.0,
            ..Default::default()
        });
        state.assets.push(Asset {
            id: 1,
            name: "Bike".to_string(),
            value: 300.0,
        });
        state.debts.push(Debt {
            kind: DebtKind::Borrowed,
            amount: 100.0,
            paid: 40.0,
            ..Default::default()
        });
        state.debts.push(Debt {
            kind: DebtKind::Lent,
            amount: 50.0,
            ..Default::default()
        });
        let summary = summarize(&state, now);
        assert_eq!(net_worth(&state, &summary), 1_000.0 + 200.0 + 300.0 - 60.0 + 50.0);
    }
}
