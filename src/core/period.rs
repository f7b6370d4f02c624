//! Calendar windows used by the aggregate, quest and streak logic.
//!
//! Every predicate takes the reference instant explicitly. Nothing in the core
//! reads the wall clock; callers inject the current time at the outermost
//! layer.
//!
//! Stored timestamps are UTC instants. The reference instant carries the
//! user's UTC offset, and every calendar question (which day, which week,
//! which month, what hour) is answered on the user's wall clock: an entry
//! made at 06:00 in UTC+7 on April 1 belongs to April even though it is still
//! March 31 in UTC.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};

/// `timestamp` as seen on the wall clock of `as_of`.
#[must_use]
pub fn local(timestamp: DateTime<Utc>, as_of: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    timestamp.with_timezone(as_of.offset())
}

/// True when `timestamp` falls in the same calendar month and year as `as_of`.
#[must_use]
pub fn is_current_month(timestamp: DateTime<Utc>, as_of: DateTime<FixedOffset>) -> bool {
    let timestamp = local(timestamp, as_of);
    timestamp.year() == as_of.year() && timestamp.month() == as_of.month()
}

/// True when `timestamp` falls on the same calendar day as `as_of`.
#[must_use]
pub fn is_today(timestamp: DateTime<Utc>, as_of: DateTime<FixedOffset>) -> bool {
    local(timestamp, as_of).date_naive() == as_of.date_naive()
}

/// True when `timestamp` falls in the same ISO week (Monday start) as `as_of`.
#[must_use]
pub fn is_this_week(timestamp: DateTime<Utc>, as_of: DateTime<FixedOffset>) -> bool {
    local(timestamp, as_of).iso_week() == as_of.iso_week()
}

/// Month label in `YYYY-MM` form, as used by archive records.
#[must_use]
pub fn month_label(as_of: DateTime<FixedOffset>) -> String {
    as_of.format("%Y-%m").to_string()
}

/// Number of days in the month containing `date`.
#[must_use]
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map_or(31, |last| last.day())
}

/// Days left in the month of `as_of`, counting today.
#[must_use]
pub fn remaining_days_in_month(as_of: DateTime<FixedOffset>) -> u32 {
    let today = as_of.date_naive();
    days_in_month(today) - today.day() + 1
}

/// The calendar day before `date`.
#[must_use]
pub fn previous_day(date: NaiveDate) -> NaiveDate {
    date - Duration::days(1)
}
