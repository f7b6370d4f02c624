//! Tunable gamification rules.
//!
//! Built from the `[gamification]` section of the settings file; the
//! defaults are the values the app ships with.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Reward and XP constants consumed by the engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Mustika granted for every level reached
    pub level_reward: f64,
    /// Mustika granted by the once-a-day bonus claim
    pub daily_bonus: f64,
    /// Passive XP per recorded transaction
    pub xp_per_transaction: f64,
    /// Passive XP for the first app open of a day
    pub xp_per_app_open: f64,
    /// Flat bonus for completing at least three daily quests
    pub daily_quest_bonus: f64,
    /// Flat bonus for completing every weekly quest
    pub weekly_quest_bonus: f64,
    /// Transactions before this hour (UTC) count toward the morning streak
    pub morning_cutoff_hour: u32,
    /// Redeem code to Mustika amount
    pub redeem_codes: BTreeMap<String, f64>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            level_reward: 100.0,
            daily_bonus: 10.0,
            xp_per_transaction: 5.0,
            xp_per_app_open: 2.0,
            daily_quest_bonus: 25.0,
            weekly_quest_bonus: 100.0,
            morning_cutoff_hour: 10,
            redeem_codes: BTreeMap::new(),
        }
    }
}
