//! Month close and full reset.
//!
//! Closing the books freezes every open transaction into an immutable
//! [`Archive`] for the month and starts the next one with empty ledgers.
//! Permanent budgets carry over with an empty history; temporary budgets are
//! archived. Savings goals, debts, assets and earlier archives are not
//! month-scoped and are left alone.

use crate::core::aggregate::{MonthlySummary, summarize};
use crate::core::period::month_label;
use crate::core::state::{
    AppState, Archive, ArchivedKind, ArchivedTransaction, FundKind, Profile,
};
use crate::core::streaks::record_month_close;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::mem;

const INCOME_LABEL: &str = "Income";
const GENERAL_LABEL: &str = "General";
const DAILY_LABEL: &str = "Daily";
const FUND_ICON: &str = "wallet";
const DAILY_ICON: &str = "receipt";
const NEUTRAL_COLOR: &str = "#64748b";

/// Outcome of a month close.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCloseReport {
    /// `YYYY-MM` of the archived month
    pub month: String,
    /// Transactions moved into the archive
    pub archived_count: usize,
    /// Totals of the month just closed
    pub summary: MonthlySummary,
    /// Temporary budgets archived by the close
    pub archived_budgets: Vec<String>,
    /// Monthly streak after the close
    pub monthly_streak: u32,
}

fn archived(
    desc: String,
    amount: f64,
    timestamp: DateTime<Utc>,
    kind: ArchivedKind,
    category: &str,
    icon: &str,
    color: &str,
) -> ArchivedTransaction {
    ArchivedTransaction {
        desc,
        amount,
        timestamp,
        kind,
        category: category.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
    }
}

/// Archives the month of `as_of` and resets the open ledgers.
///
/// Every open entry (fund history, daily expenses, budget histories) is
/// converted to an [`ArchivedTransaction`] carrying its category, icon and
/// color, sorted by timestamp and stored as one new [`Archive`] labelled with
/// the month of `as_of` on the user's wall clock. Temporary budgets are
/// archived, permanent ones keep their quota with an empty history, and the
/// monthly streak advances when the month closed with a non-negative balance.
///
/// # Arguments
/// * `state` - The state to close; left with empty open ledgers
/// * `as_of` - The user's wall-clock instant; picks the month label
///
/// # Returns
/// A [`MonthlyCloseReport`] with the pre-close totals and what was archived.
pub fn close_month(state: &mut AppState, as_of: DateTime<FixedOffset>) -> MonthlyCloseReport {
    let closing = summarize(state, as_of);
    let mut transactions = Vec::with_capacity(state.open_transaction_count());

    for tx in mem::take(&mut state.fund_history) {
        let (kind, category) = match tx.kind {
            FundKind::Add => (ArchivedKind::Income, INCOME_LABEL),
            FundKind::Remove => (ArchivedKind::GeneralExpense, GENERAL_LABEL),
        };
        transactions.push(archived(
            tx.desc,
            tx.amount,
            tx.timestamp,
            kind,
            category,
            FUND_ICON,
            NEUTRAL_COLOR,
        ));
    }

    for tx in mem::take(&mut state.daily_expenses) {
        let category = tx.source_category.as_deref().unwrap_or(DAILY_LABEL).to_string();
        transactions.push(archived(
            tx.desc,
            tx.amount,
            tx.timestamp,
            ArchivedKind::DailyExpense,
            &category,
            DAILY_ICON,
            NEUTRAL_COLOR,
        ));
    }

    let mut archived_budgets = Vec::new();
    for budget in &mut state.budgets {
        for tx in mem::take(&mut budget.history) {
            transactions.push(archived(
                tx.desc,
                tx.amount,
                tx.timestamp,
                ArchivedKind::BudgetExpense,
                &budget.name,
                &budget.icon,
                &budget.color,
            ));
        }
        if budget.is_temporary && !budget.is_archived {
            budget.is_archived = true;
            archived_budgets.push(budget.name.clone());
        }
    }

    transactions.sort_by_key(|t| t.timestamp);
    let month = month_label(as_of);
    let archived_count = transactions.len();
    state.archives.push(Archive {
        month: month.clone(),
        transactions,
    });
    record_month_close(&mut state.achievement_data, &closing);

    MonthlyCloseReport {
        month,
        archived_count,
        summary: closing,
        archived_budgets,
        monthly_streak: state.achievement_data.monthly_streak,
    }
}

/// Wipes every ledger. Only the profile name survives.
pub fn reset_all(state: &mut AppState) {
    let name = mem::take(&mut state.profile.name);
    *state = AppState {
        profile: Profile {
            name,
            ..Profile::default()
        },
        ..AppState::default()
    };
}

/// Formats a close report for logs and the terminal.
#[must_use]
pub fn format_close_summary(report: &MonthlyCloseReport) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Month Closed - {} - Archived {} transactions\n",
        report.month, report.archived_count
    );

    // write! into a String cannot fail
    let _ = writeln!(
        summary,
        "  Income: {:.0} | Spent: {:.0} | Remaining: {:.0}",
        report.summary.monthly_income, report.summary.total_used_overall, report.summary.total_remaining
    );
    let _ = writeln!(summary, "  Monthly streak: {}", report.monthly_streak);
    for name in &report.archived_budgets {
        let _ = writeln!(summary, "  Temporary budget archived: {name}");
    }

    summary
}
