//! Point pools, levels and level-up rewards.
//!
//! Two totals are derived from overlapping pools and are deliberately kept
//! apart:
//!
//! * `total_xp` decides the level: achievement, quest, bonus, redeemed and
//!   passive XP. Spending Mustika never lowers it.
//! * `spendable_mustika` is the shop currency: achievement, quest, bonus,
//!   redeemed and level-reward points minus everything already spent.
//!   Passive XP is not spendable and level rewards do not feed XP.

use crate::core::achievements::achievement_points;
use crate::core::aggregate::MonthlySummary;
use crate::core::quests::quest_board;
use crate::core::rules::GameRules;
use crate::core::state::AppState;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// XP per squared level step.
pub const XP_PER_LEVEL_STEP: f64 = 50.0;

/// Highest reachable level. Reached at 50 * 998,001 XP.
pub const MAX_LEVEL: u32 = 1_000;

/// All derived point values at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointTotals {
    /// Points from unlocked achievements
    pub achievement_points: f64,
    /// Points from the live quest board
    pub quest_points: f64,
    /// Level-determining total
    pub total_xp: f64,
    /// Current level
    pub level: u32,
    /// XP where the next level starts
    pub next_level_xp: f64,
    /// Shop currency balance
    pub spendable_mustika: f64,
}

/// `floor(sqrt(xp / 50)) + 1`, capped at [`MAX_LEVEL`]. Negative and NaN
/// XP count as zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn level_for_xp(xp: f64) -> u32 {
    let xp = if xp.is_nan() { 0.0 } else { xp.max(0.0) };
    let steps = (xp / XP_PER_LEVEL_STEP)
        .sqrt()
        .floor()
        .min(f64::from(MAX_LEVEL - 1));
    // steps is in [0, MAX_LEVEL - 1]
    steps as u32 + 1
}

/// XP at which `level` starts.
#[must_use]
pub fn xp_for_level(level: u32) -> f64 {
    let step = f64::from(level.saturating_sub(1));
    XP_PER_LEVEL_STEP * step * step
}

/// Derives every point value from the state.
#[must_use]
pub fn point_totals(
    state: &AppState,
    summary: &MonthlySummary,
    as_of: DateTime<FixedOffset>,
    rules: &GameRules,
) -> PointTotals {
    let profile = &state.profile;
    let achievement_points = achievement_points(state);
    let quest_points = quest_board(state, summary, as_of, rules).total_points;

    let shared = achievement_points + quest_points + profile.bonus_points + profile.redeemed_mustika;
    let total_xp = shared + profile.accumulated_xp;
    let spendable_mustika = shared + profile.level_reward_points - profile.spent_points;
    let level = level_for_xp(total_xp);

    PointTotals {
        achievement_points,
        quest_points,
        total_xp,
        level,
        next_level_xp: xp_for_level(level.saturating_add(1).min(MAX_LEVEL)),
        spendable_mustika,
    }
}

/// Grants the level reward for every level in `2..=level` that has not been
/// claimed yet and records it as claimed. Returns the levels granted now;
/// calling again at the same level grants nothing.
pub fn grant_level_rewards(state: &mut AppState, level: u32, reward: f64) -> Vec<u32> {
    let profile = &mut state.profile;
    let granted: Vec<u32> = (2..=level.min(MAX_LEVEL))
        .filter(|l| !profile.level_rewards_claimed.contains(l))
        .collect();
    for l in &granted {
        profile.level_rewards_claimed.push(*l);
        profile.level_reward_points += reward;
    }
    granted
}
