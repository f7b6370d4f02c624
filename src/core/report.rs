//! Text reports over the derived state.
//!
//! Structured data first ([`BudgetLine`], [`budget_lines`]); the `format_*`
//! functions turn it into plain text for logs and the terminal.

use crate::core::aggregate::{MonthlySummary, remaining_quota, used_this_month};
use crate::core::level::PointTotals;
use crate::core::quests::QuestBoard;
use crate::core::state::{Amount, AppState};
use chrono::{DateTime, FixedOffset};
use std::fmt::Write;

/// One budget's standing for the month.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetLine {
    /// Budget name
    pub name: String,
    /// Monthly quota
    pub total: Amount,
    /// Spent this month
    pub used: Amount,
    /// Quota left, negative once overspent
    pub remaining: Amount,
    /// Remaining as a percentage of the quota
    pub progress_percent: f64,
}

/// Active budgets in display order.
#[must_use]
pub fn budget_lines(state: &AppState, as_of: DateTime<FixedOffset>) -> Vec<BudgetLine> {
    let mut budgets: Vec<_> = state.active_budgets().collect();
    budgets.sort_by_key(|b| b.order);
    budgets
        .into_iter()
        .map(|b| {
            let remaining = remaining_quota(b, as_of);
            BudgetLine {
                name: b.name.clone(),
                total: b.total_budget,
                used: used_this_month(b, as_of),
                remaining,
                progress_percent: calculate_progress(remaining, b.total_budget),
            }
        })
        .collect()
}

/// Remaining share of a quota in percent; negative when overspent, zero for
/// an empty quota.
#[must_use]
pub fn calculate_progress(remaining: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }

    (remaining / total) * 100.0
}

/// A text progress bar like `[████████░░] 80.0%`.
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // clamped_progress is in [0, 100] and length is small
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!(
        "[{}{}] {progress_percent:.1}%",
        "█".repeat(filled),
        "░".repeat(empty)
    )
}

/// Formats the month's totals, every budget and the player's standing.
#[must_use]
pub fn format_dashboard(
    state: &AppState,
    summary: &MonthlySummary,
    totals: &PointTotals,
    quests: &QuestBoard,
    as_of: DateTime<FixedOffset>,
) -> String {
    let mut out = format!("Budget Quest - {}\n", as_of.format("%B %Y"));

    // write! into a String cannot fail
    let _ = writeln!(
        out,
        "  Income: {:.0} | Spent: {:.0} | Remaining: {:.0}",
        summary.monthly_income, summary.total_used_overall, summary.total_remaining
    );
    let _ = writeln!(
        out,
        "  Available: {:.0} | Daily quota: {:.0} ({} days left)",
        summary.current_available_funds, summary.daily_quota, summary.remaining_days
    );

    for line in budget_lines(state, as_of) {
        let _ = writeln!(
            out,
            "  {} {:.0}/{:.0} {}",
            line.name,
            line.used,
            line.total,
            format_progress_bar(line.progress_percent, None)
        );
    }

    let done = |list: &[crate::core::quests::QuestStatus]| list.iter().filter(|q| q.completed).count();
    let _ = writeln!(
        out,
        "  Level {} ({:.0}/{:.0} XP) | Mustika: {:.0}",
        totals.level, totals.total_xp, totals.next_level_xp, totals.spendable_mustika
    );
    let _ = writeln!(
        out,
        "  Quests: {}/{} daily, {}/{} weekly | Streak: {} days",
        done(&quests.daily),
        quests.daily.len(),
        done(&quests.weekly),
        quests.weekly.len(),
        state.achievement_data.app_open_streak
    );

    out
}
