//! Streak bookkeeping.
//!
//! A streak grows by one on the first qualifying event of a day that directly
//! follows the previous qualifying day, restarts at one after a gap, and drops
//! to zero whenever its defining condition is violated.

use crate::core::aggregate::{MonthlySummary, spent_today};
use crate::core::period::previous_day;
use crate::core::state::{AchievementData, AppState};
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};

/// Advances `counter` for a qualifying event on `today`. Returns whether the
/// counter changed.
fn bump_consecutive(counter: &mut u32, last: &mut Option<NaiveDate>, today: NaiveDate) -> bool {
    match *last {
        Some(day) if day == today => return false,
        Some(day) if day == previous_day(today) => *counter += 1,
        _ => *counter = 1,
    }
    *last = Some(today);
    true
}

/// Records an app open. Returns `true` for the first open of the day.
pub fn record_app_open(data: &mut AchievementData, today: NaiveDate) -> bool {
    let first_today = bump_consecutive(&mut data.app_open_streak, &mut data.last_app_open, today);
    if first_today {
        data.app_opens += 1;
    }
    first_today
}

/// Once per day: advances the daily-quota streak from the current summary and
/// the no-spend streak from yesterday's spending.
pub fn run_daily_check(
    state: &mut AppState,
    summary: &MonthlySummary,
    as_of: DateTime<FixedOffset>,
) {
    let today = as_of.date_naive();
    let yesterday = previous_day(today);
    let last = state.achievement_data.last_daily_check;
    if last == Some(today) {
        return;
    }
    let continues = last == Some(yesterday);
    let spent_yesterday = spent_today(state, as_of - chrono::Duration::days(1)) > 0.0;

    let data = &mut state.achievement_data;
    data.daily_streak = match (summary.daily_quota >= 0.0, continues) {
        (false, _) => 0,
        (true, true) => data.daily_streak + 1,
        (true, false) => 1,
    };
    data.no_spend_streak = match (spent_yesterday, continues) {
        (true, _) => 0,
        (false, true) => data.no_spend_streak + 1,
        (false, false) => 1,
    };
    data.last_daily_check = Some(today);
}

/// Records an expense: it breaks the no-spend streak and may advance the
/// morning streak. The cutoff is an hour on the user's wall clock.
pub fn record_expense(
    data: &mut AchievementData,
    as_of: DateTime<FixedOffset>,
    morning_cutoff_hour: u32,
) {
    data.no_spend_streak = 0;
    if as_of.hour() < morning_cutoff_hour {
        bump_consecutive(
            &mut data.morning_transaction_streak,
            &mut data.last_morning_transaction,
            as_of.date_naive(),
        );
    }
}

/// Records a savings contribution.
pub fn record_saving(data: &mut AchievementData, today: NaiveDate) {
    bump_consecutive(&mut data.saving_streak, &mut data.last_saving, today);
}

/// Called when a month is closed with the closing month's summary.
pub fn record_month_close(data: &mut AchievementData, closing: &MonthlySummary) {
    data.monthly_streak = if closing.total_remaining >= 0.0 {
        data.monthly_streak + 1
    } else {
        0
    };
}

/// Zeroes the streaks whose invariant the new aggregates violate.
pub fn reset_violated(data: &mut AchievementData, summary: &MonthlySummary) {
    if summary.total_remaining < 0.0 {
        data.monthly_streak = 0;
    }
    if summary.daily_quota < 0.0 {
        data.daily_streak = 0;
    }
}
