//! Application settings loaded from `config.toml`.
//!
//! The file is optional: a missing file yields the defaults and a warning, a
//! malformed one is an error. Budgets listed under `[[budgets]]` seed a fresh
//! state on first run.

use crate::core::budget::{NewBudget, create_budget};
use crate::core::rules::GameRules;
use crate::core::state::AppState;
use crate::errors::{Error, Result};
use chrono::{FixedOffset, Local};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Environment variable naming the settings file.
pub const CONFIG_PATH_VAR: &str = "BUDGET_QUEST_CONFIG";
/// Settings file used when the variable is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Everything in `config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Version in the snapshot key and the export envelope
    pub app_version: String,
    /// Key of the export obfuscation
    pub export_secret: String,
    /// Rotating backups kept before the oldest is evicted
    pub max_backups: usize,
    /// Age of the newest backup that triggers an automatic one
    pub backup_interval_days: i64,
    /// The user's offset from UTC in minutes (420 for WIB); the system's
    /// local offset when unset. Days, weeks and months follow this clock.
    pub utc_offset_minutes: Option<i32>,
    /// Gamification constants
    pub gamification: GameRules,
    /// Budgets created on first run
    pub budgets: Vec<SeedBudget>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_version: "3.0".to_string(),
            export_secret: "budget-quest".to_string(),
            max_backups: 5,
            backup_interval_days: 7,
            utc_offset_minutes: None,
            gamification: GameRules::default(),
            budgets: Vec::new(),
        }
    }
}

/// A budget to create on first run
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedBudget {
    /// Name of the budget
    pub name: String,
    /// Monthly quota
    pub total_budget: f64,
    /// Icon name
    pub icon: Option<String>,
    /// Color
    pub color: Option<String>,
    /// Archive at month close
    #[serde(default)]
    pub is_temporary: bool,
}

fn fixed_offset(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

impl Settings {
    /// The offset calendar predicates are evaluated in.
    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .and_then(fixed_offset)
            .unwrap_or_else(|| *Local::now().offset())
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })?;
    if let Some(minutes) = settings
        .utc_offset_minutes
        .filter(|m| fixed_offset(*m).is_none())
    {
        return Err(Error::Config {
            message: format!("utc_offset_minutes out of range: {minutes}"),
        });
    }
    Ok(settings)
}

/// Loads settings from `path`. A missing file gives the defaults.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("Settings file {:?} not found, using defaults", path);
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path.display()),
    })?;
    let settings = parse_settings(&contents)?;
    info!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Loads settings from `BUDGET_QUEST_CONFIG` or `./config.toml`.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_settings(path)
}

/// A fresh state holding the configured seed budgets.
pub fn seed_state(settings: &Settings) -> Result<AppState> {
    let mut state = AppState::default();
    for seed in &settings.budgets {
        create_budget(
            &mut state,
            NewBudget {
                name: seed.name.clone(),
                total_budget: seed.total_budget,
                icon: seed.icon.clone(),
                color: seed.color.clone(),
                is_temporary: seed.is_temporary,
            },
        )?;
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r##"
            app_version = "3.1"
            export_secret = "s3cret"
            max_backups = 3

            [gamification]
            level_reward = 50.0
            daily_bonus = 20.0

            [gamification.redeem_codes]
            WELCOME = 100.0

            [[budgets]]
            name = "Food"
            total_budget = 1500000.0
            icon = "utensils"

            [[budgets]]
            name = "Holiday"
            total_budget = 500000.0
            is_temporary = true
        "##;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.app_version, "3.1");
        assert_eq!(settings.max_backups, 3);
        assert_eq!(settings.backup_interval_days, 7);
        assert_eq!(settings.gamification.level_reward, 50.0);
        assert_eq!(settings.gamification.xp_per_transaction, 5.0);
        assert_eq!(settings.gamification.redeem_codes["WELCOME"], 100.0);
        assert_eq!(settings.budgets.len(), 2);
        assert!(settings.budgets[1].is_temporary);
    }

    #[test]
    fn test_utc_offset() {
        let settings = parse_settings("utc_offset_minutes = 420").unwrap();
        assert_eq!(settings.utc_offset().local_minus_utc(), 7 * 3600);

        let err = parse_settings("utc_offset_minutes = 100000").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse_settings("").unwrap(), Settings::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let err = parse_settings("max_backups = \"many\"").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = load_settings("does/not/exist.toml").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_seed_state_creates_budgets() {
        let settings = Settings {
            budgets: vec![SeedBudget {
                name: "Food".to_string(),
                total_budget: 100.0,
                icon: None,
                color: None,
                is_temporary: false,
            }],
            ..Settings::default()
        };
        let state = seed_state(&settings).unwrap();
        assert_eq!(state.budgets.len(), 1);
        assert_eq!(state.budgets[0].id, 1);
        assert_eq!(state.budgets[0].icon, "wallet");
    }
}
