//! Daily and weekly quests.
//!
//! Quests are never persisted. The board is recomputed from the live state
//! and the reference instant on every call, so the same state read at a later
//! time can show different completions.

use crate::core::aggregate::{MonthlySummary, remaining_quota};
use crate::core::period::{is_this_week, is_today};
use crate::core::rules::GameRules;
use crate::core::state::{AppState, FundKind, SavingKind};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// Points for each completed daily quest.
pub const DAILY_QUEST_POINTS: f64 = 10.0;
/// Points for each completed weekly quest.
pub const WEEKLY_QUEST_POINTS: f64 = 25.0;
/// Daily quests needed for the daily bonus.
pub const DAILY_BONUS_THRESHOLD: usize = 3;

/// A quest and whether it is complete right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestStatus {
    /// Stable id
    pub id: &'static str,
    /// Display text
    pub title: &'static str,
    /// Whether the predicate holds in the current window
    pub completed: bool,
    /// Points while completed
    pub points: f64,
}

/// Both boards plus the points they are worth right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestBoard {
    /// Today's quests
    pub daily: Vec<QuestStatus>,
    /// This week's quests
    pub weekly: Vec<QuestStatus>,
    /// Whether the daily bonus threshold is met
    pub daily_bonus_earned: bool,
    /// Whether every weekly quest is complete
    pub weekly_bonus_earned: bool,
    /// Completed quest points plus earned bonuses
    pub total_points: f64,
}

fn expense_timestamps(state: &AppState) -> impl Iterator<Item = DateTime<Utc>> + '_ {
    let posts = state
        .budgets
        .iter()
        .flat_map(|b| b.history.iter().map(|t| t.timestamp));
    let daily = state.daily_expenses.iter().map(|t| t.timestamp);
    let general = state
        .fund_history
        .iter()
        .filter(|t| t.kind == FundKind::Remove)
        .map(|t| t.timestamp);
    posts.chain(daily).chain(general)
}

fn contributions(state: &AppState) -> impl Iterator<Item = DateTime<Utc>> + '_ {
    state
        .savings_goals
        .iter()
        .flat_map(|g| g.history.iter())
        .filter(|t| t.kind == SavingKind::Add)
        .map(|t| t.timestamp)
}

fn daily(id: &'static str, title: &'static str, completed: bool) -> QuestStatus {
    QuestStatus {
        id,
        title,
        completed,
        points: DAILY_QUEST_POINTS,
    }
}

fn weekly(id: &'static str, title: &'static str, completed: bool) -> QuestStatus {
    QuestStatus {
        id,
        title,
        completed,
        points: WEEKLY_QUEST_POINTS,
    }
}

/// Builds the daily quest list for the day of `as_of`.
#[must_use]
pub fn daily_quests(
    state: &AppState,
    summary: &MonthlySummary,
    as_of: DateTime<FixedOffset>,
) -> Vec<QuestStatus> {
    let expenses_today = expense_timestamps(state)
        .filter(|ts| is_today(*ts, as_of))
        .count();
    let opened_today = state.achievement_data.last_app_open == Some(as_of.date_naive());
    let saved_today = contributions(state).any(|ts| is_today(ts, as_of));

    vec![
        daily("check_in", "Open the app today", opened_today),
        daily("log_expense", "Record an expense today", expenses_today >= 1),
        daily("log_three", "Record three expenses today", expenses_today >= 3),
        daily(
            "within_quota",
            "Keep today's quota non-negative",
            summary.daily_quota >= 0.0,
        ),
        daily("save_today", "Put something into savings today", saved_today),
    ]
}

/// Builds the weekly quest list for the ISO week of `as_of`.
#[must_use]
pub fn weekly_quests(state: &AppState, as_of: DateTime<FixedOffset>) -> Vec<QuestStatus> {
    let expenses_this_week = expense_timestamps(state)
        .filter(|ts| is_this_week(*ts, as_of))
        .count();
    let income_this_week = state
        .fund_history
        .iter()
        .any(|t| t.kind == FundKind::Add && is_this_week(t.timestamp, as_of));
    let saves_this_week = contributions(state)
        .filter(|ts| is_this_week(*ts, as_of))
        .count();
    let debt_paid_this_week = state
        .debts
        .iter()
        .flat_map(|d| d.history.iter())
        .any(|r| is_this_week(r.timestamp, as_of));
    let budgets_intact = state.active_budgets().next().is_some()
        && state
            .active_budgets()
            .all(|b| remaining_quota(b, as_of) >= 0.0);

    vec![
        weekly("log_seven", "Record seven expenses this week", expenses_this_week >= 7),
        weekly("income_week", "Record income this week", income_this_week),
        weekly("save_twice", "Save twice this week", saves_this_week >= 2),
        weekly("pay_debt", "Make a debt payment this week", debt_paid_this_week),
        weekly(
            "budgets_intact",
            "Keep every budget within quota",
            budgets_intact,
        ),
    ]
}

fn completed_points(quests: &[QuestStatus]) -> f64 {
    quests.iter().filter(|q| q.completed).map(|q| q.points).sum()
}

/// Recomputes both boards and their point value.
#[must_use]
pub fn quest_board(
    state: &AppState,
    summary: &MonthlySummary,
    as_of: DateTime<FixedOffset>,
    rules: &GameRules,
) -> QuestBoard {
    let daily = daily_quests(state, summary, as_of);
    let weekly = weekly_quests(state, as_of);
    let daily_bonus_earned = daily.iter().filter(|q| q.completed).count() >= DAILY_BONUS_THRESHOLD;
    let weekly_bonus_earned = weekly.iter().all(|q| q.completed);

    let mut total_points = completed_points(&daily) + completed_points(&weekly);
    if daily_bonus_earned {
        total_points += rules.daily_quest_bonus;
    }
    if weekly_bonus_earned {
        total_points += rules.weekly_quest_bonus;
    }

    QuestBoard {
        daily,
        weekly,
        daily_bonus_earned,
        weekly_bonus_earned,
        total_points,
    }
}
