//! The state container.
//!
//! [`Store`] owns the current [`AppState`] and is the only writer. Every
//! change goes through [`Store::dispatch`], which runs the engine and swaps in
//! the new snapshot in one step. Persistence is best effort: a failed save is
//! logged and the in-memory state stays authoritative.

use crate::config::settings::Settings;
use crate::core::aggregate::{MonthlySummary, summarize};
use crate::core::budget::{ExpensePlan, OverageSplit, plan_budget_expense};
use crate::core::engine::{Context, Effect, Mutation, apply};
use crate::core::level::{PointTotals, point_totals};
use crate::core::quests::{QuestBoard, quest_board};
use crate::core::state::AppState;
use crate::errors::{Error, Result};
use crate::storage::{LocalStorage, backup, export, snapshot};
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, error, info, warn};

/// What a successful dispatch produced, minus the state the store kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// Aggregates after the mutation
    pub summary: MonthlySummary,
    /// Point values after the mutation
    pub totals: PointTotals,
    /// Achievements unlocked by the mutation
    pub unlocked: Vec<&'static str>,
    /// Levels rewarded by the mutation
    pub levels_granted: Vec<u32>,
    /// Mutation-specific result
    pub effect: Effect,
}

/// Single-writer owner of the app state.
#[derive(Debug)]
pub struct Store {
    state: AppState,
    settings: Settings,
    storage: Option<LocalStorage>,
    notification: Option<String>,
}

impl Store {
    /// A store without persistence.
    #[must_use]
    pub const fn new(state: AppState, settings: Settings) -> Self {
        Self {
            state,
            settings,
            storage: None,
            notification: None,
        }
    }

    /// A store that saves after every accepted mutation.
    #[must_use]
    pub const fn with_storage(state: AppState, settings: Settings, storage: LocalStorage) -> Self {
        Self {
            state,
            settings,
            storage: Some(storage),
            notification: None,
        }
    }

    /// Loads the persisted state, or seeds a fresh one from the settings.
    ///
    /// An unreadable snapshot is copied to a quarantine key before the store
    /// starts from a fresh state, so the next save cannot destroy it. If the
    /// copy fails the store refuses to open.
    pub async fn open(storage: LocalStorage, settings: Settings) -> Result<Self> {
        let state = match snapshot::load_state(&storage, &settings.app_version).await {
            Ok(Some(state)) => {
                info!("Loaded saved state ({} budgets)", state.budgets.len());
                state
            }
            Ok(None) => {
                info!("Starting from a fresh state");
                crate::config::settings::seed_state(&settings)?
            }
            Err(e) => {
                error!("Failed to load saved state: {}", e);
                snapshot::quarantine_state(&storage, &settings.app_version, Utc::now())
                    .await
                    .inspect_err(|e| error!("Failed to quarantine saved state: {}", e))?;
                info!("Starting from a fresh state");
                crate::config::settings::seed_state(&settings)?
            }
        };
        Ok(Self::with_storage(state, settings, storage))
    }

    /// Current snapshot.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// `as_of` on the user's wall clock.
    #[must_use]
    pub fn wall_clock(&self, as_of: DateTime<Utc>) -> DateTime<FixedOffset> {
        as_of.with_timezone(&self.settings.utc_offset())
    }

    /// Aggregates of the month containing `as_of`.
    #[must_use]
    pub fn summary(&self, as_of: DateTime<Utc>) -> MonthlySummary {
        summarize(&self.state, self.wall_clock(as_of))
    }

    /// Point values at `as_of`.
    #[must_use]
    pub fn totals(&self, as_of: DateTime<Utc>) -> PointTotals {
        let summary = self.summary(as_of);
        point_totals(
            &self.state,
            &summary,
            self.wall_clock(as_of),
            &self.settings.gamification,
        )
    }

    /// Quest board at `as_of`.
    #[must_use]
    pub fn quests(&self, as_of: DateTime<Utc>) -> QuestBoard {
        let summary = self.summary(as_of);
        quest_board(
            &self.state,
            &summary,
            self.wall_clock(as_of),
            &self.settings.gamification,
        )
    }

    /// Takes the pending one-shot notification, if any.
    pub const fn take_notification(&mut self) -> Option<String> {
        self.notification.take()
    }

    /// Applies a mutation at `as_of`. On error the state is unchanged.
    pub fn dispatch(&mut self, mutation: &Mutation, as_of: DateTime<Utc>) -> Result<Applied> {
        let ctx = Context {
            as_of: self.wall_clock(as_of),
            rules: &self.settings.gamification,
        };
        let outcome = apply(&self.state, mutation, &ctx).inspect_err(|e| {
            if e.is_rejection() {
                debug!("Rejected {}: {}", mutation.name(), e);
            } else {
                warn!("Failed {}: {}", mutation.name(), e);
            }
        })?;

        self.state = outcome.state;
        if outcome.notification.is_some() {
            self.notification = outcome.notification;
        }
        Ok(Applied {
            summary: outcome.summary,
            totals: outcome.totals,
            unlocked: outcome.unlocked,
            levels_granted: outcome.levels_granted,
            effect: outcome.effect,
        })
    }

    /// [`Store::dispatch`] at the current wall-clock time.
    pub fn dispatch_now(&mut self, mutation: &Mutation) -> Result<Applied> {
        self.dispatch(mutation, Utc::now())
    }

    /// Records a budget expense, asking `confirm` before splitting one that
    /// exceeds the remaining quota. Returns `Ok(None)` when the split was
    /// declined; the state is then unchanged.
    pub fn record_budget_expense(
        &mut self,
        budget_id: i64,
        desc: &str,
        amount: f64,
        as_of: DateTime<Utc>,
        confirm: impl FnOnce(&OverageSplit) -> bool,
    ) -> Result<Option<Applied>> {
        let plan = plan_budget_expense(&self.state, budget_id, amount, self.wall_clock(as_of))?;
        let mutation = match plan {
            ExpensePlan::Within { .. } => Mutation::AddBudgetExpense {
                budget_id,
                desc: desc.to_string(),
                amount,
            },
            ExpensePlan::Overage(split) => {
                if !confirm(&split) {
                    debug!("Overage split on budget {} declined", budget_id);
                    return Ok(None);
                }
                Mutation::ApplyOverageSplit {
                    budget_id,
                    desc: desc.to_string(),
                    amount,
                }
            }
        };
        self.dispatch(&mutation, as_of).map(Some)
    }

    /// Saves the current state. Failures are logged, never propagated.
    /// Returns whether the state was saved.
    pub async fn persist(&self) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };
        match snapshot::save_state(storage, &self.state, &self.settings.app_version).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save state: {}", e);
                false
            }
        }
    }

    /// [`Store::dispatch`] followed by [`Store::persist`].
    pub async fn dispatch_and_persist(
        &mut self,
        mutation: &Mutation,
        as_of: DateTime<Utc>,
    ) -> Result<Applied> {
        let applied = self.dispatch(mutation, as_of)?;
        self.persist().await;
        Ok(applied)
    }

    /// The current state as an export file.
    pub fn export_backup(&self) -> Result<String> {
        export::encode_backup(
            &self.state,
            &self.settings.app_version,
            &self.settings.export_secret,
        )
    }

    /// Replaces the state with an imported file. A bad file leaves the state
    /// untouched.
    pub async fn import_backup(&mut self, raw: &str) -> Result<()> {
        let imported = export::decode_backup(raw, &self.settings.export_secret)
            .inspect_err(|e| warn!("Import rejected: {}", e))?;
        self.state = imported;
        info!("Imported backup");
        self.persist().await;
        Ok(())
    }

    /// Writes a backup now. Requires storage.
    pub async fn backup_now(&self, as_of: DateTime<Utc>) -> Result<Option<String>> {
        match &self.storage {
            Some(storage) => backup::create_backup(storage, &self.state, &self.settings, as_of)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    /// Writes a backup if the newest one is older than the interval.
    pub async fn auto_backup(&self, as_of: DateTime<Utc>) -> Result<Option<String>> {
        match &self.storage {
            Some(storage) => backup::auto_backup(storage, &self.state, &self.settings, as_of).await,
            None => Ok(None),
        }
    }

    /// Replaces the state with a stored backup. Fails without storage.
    pub async fn restore_backup(&mut self, key: &str) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Err(Error::StorageUnavailable {
                action: format!("restore backup {key}"),
            });
        };
        let restored = backup::restore_backup(storage, key, &self.settings.export_secret).await?;
        self.state = restored;
        info!("Restored backup {}", key);
        self.persist().await;
        Ok(())
    }
}
