//! Mutation Engine - the single funnel for every state change.
//!
//! [`apply`] works on a clone of the current state and hands back a complete
//! next snapshot. A rejected mutation returns `Err` before anything is
//! observable, so the caller's state is never left half-updated.
//!
//! After the transform, every mutation goes through the same post-pass:
//!
//! 1. recompute the [`MonthlySummary`],
//! 2. zero streaks whose invariant the new totals violate,
//! 3. unlock newly satisfied achievements,
//! 4. grant level rewards for levels reached but not yet claimed.

use crate::core::achievements::newly_satisfied;
use crate::core::aggregate::{MonthlySummary, summarize};
use crate::core::budget::{
    BudgetChanges, ExpensePlan, NewBudget, add_budget_expense, apply_overage_split,
    create_budget, delete_budget, reorder_budgets, set_archived, update_budget,
};
use crate::core::holdings::{
    NewDebt, add_debt, delete_debt, record_payment, remove_asset, upsert_asset,
};
use crate::core::intake::{LineItem, admit_line_items};
use crate::core::level::{PointTotals, grant_level_rewards, point_totals};
use crate::core::monthly::{MonthlyCloseReport, close_month, reset_all};
use crate::core::rewards::{claim_daily_bonus, purchase_item, redeem_code};
use crate::core::rules::GameRules;
use crate::core::savings::{NewGoal, add_saving, create_goal, delete_goal, withdraw_saving};
use crate::core::state::AppState;
use crate::core::streaks::{record_app_open, record_expense, reset_violated, run_daily_check};
use crate::core::transaction::{
    TxLocation, add_daily_expense, add_general_expense, add_income, delete_transaction,
    edit_transaction,
};
use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Two independent confirmations for destructive actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DoubleConfirmation {
    /// First prompt accepted
    pub first: bool,
    /// Second prompt accepted
    pub second: bool,
}

impl DoubleConfirmation {
    /// Both prompts accepted.
    #[must_use]
    pub const fn both() -> Self {
        Self {
            first: true,
            second: true,
        }
    }

    const fn confirmed(self) -> bool {
        self.first && self.second
    }
}

/// Every intent the engine accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    // === Budgets ===
    /// Create a budget envelope
    CreateBudget(NewBudget),
    /// Change a budget's fields
    UpdateBudget { id: i64, changes: BudgetChanges },
    /// Set the display order
    ReorderBudgets { ids: Vec<i64> },
    /// Soft-archive a budget
    ArchiveBudget { id: i64 },
    /// Bring an archived budget back
    RestoreBudget { id: i64 },
    /// Delete a budget and its history permanently
    DeleteBudget {
        id: i64,
        confirmation: DoubleConfirmation,
    },

    // === Ledger ===
    /// Record income
    AddIncome { desc: String, amount: f64 },
    /// Record a general outflow
    AddGeneralExpense { desc: String, amount: f64 },
    /// Record an expense that must fit the budget's remaining quota
    AddBudgetExpense {
        budget_id: i64,
        desc: String,
        amount: f64,
    },
    /// Record a confirmed budget expense, splitting any overage
    ApplyOverageSplit {
        budget_id: i64,
        desc: String,
        amount: f64,
    },
    /// Record an untracked daily expense
    AddDailyExpense { desc: String, amount: f64 },
    /// Admit assistant line items
    AddScannedItems {
        items: Vec<LineItem>,
        budget_id: Option<i64>,
    },
    /// Change a recorded transaction
    EditTransaction {
        location: TxLocation,
        desc: Option<String>,
        amount: Option<f64>,
    },
    /// Remove a recorded transaction
    DeleteTransaction { location: TxLocation },

    // === Savings ===
    /// Create a savings goal
    CreateSavingsGoal(NewGoal),
    /// Move money into a goal
    AddSaving { goal_id: i64, amount: f64 },
    /// Move money out of a goal
    WithdrawSaving { goal_id: i64, amount: f64 },
    /// Delete a goal, optionally refunding its balance
    DeleteSavingsGoal { goal_id: i64, refund: bool },

    // === Debts and assets ===
    /// Record a debt
    AddDebt(NewDebt),
    /// Record a repayment
    RecordDebtPayment {
        debt_id: i64,
        amount: f64,
        note: String,
        sync_wallet: bool,
    },
    /// Delete a debt
    DeleteDebt { debt_id: i64 },
    /// Create or update an asset
    UpsertAsset {
        id: Option<i64>,
        name: String,
        value: f64,
    },
    /// Remove an asset
    RemoveAsset { id: i64 },

    // === Gamification ===
    /// The app was opened
    RecordAppOpen,
    /// Claim today's bonus
    ClaimDailyBonus,
    /// Redeem a code
    RedeemCode { code: String },
    /// Buy a shop item
    PurchaseShopItem { item_id: String },

    // === Lifecycle ===
    /// Archive the current month
    CloseMonth { confirmed: bool },
    /// Wipe everything
    ResetAll { confirmation: DoubleConfirmation },
}

impl Mutation {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateBudget(_) => "create_budget",
            Self::UpdateBudget { .. } => "update_budget",
            Self::ReorderBudgets { .. } => "reorder_budgets",
            Self::ArchiveBudget { .. } => "archive_budget",
            Self::RestoreBudget { .. } => "restore_budget",
            Self::DeleteBudget { .. } => "delete_budget",
            Self::AddIncome { .. } => "add_income",
            Self::AddGeneralExpense { .. } => "add_general_expense",
            Self::AddBudgetExpense { .. } => "add_budget_expense",
            Self::ApplyOverageSplit { .. } => "apply_overage_split",
            Self::AddDailyExpense { .. } => "add_daily_expense",
            Self::AddScannedItems { .. } => "add_scanned_items",
            Self::EditTransaction { .. } => "edit_transaction",
            Self::DeleteTransaction { .. } => "delete_transaction",
            Self::CreateSavingsGoal(_) => "create_savings_goal",
            Self::AddSaving { .. } => "add_saving",
            Self::WithdrawSaving { .. } => "withdraw_saving",
            Self::DeleteSavingsGoal { .. } => "delete_savings_goal",
            Self::AddDebt(_) => "add_debt",
            Self::RecordDebtPayment { .. } => "record_debt_payment",
            Self::DeleteDebt { .. } => "delete_debt",
            Self::UpsertAsset { .. } => "upsert_asset",
            Self::RemoveAsset { .. } => "remove_asset",
            Self::RecordAppOpen => "record_app_open",
            Self::ClaimDailyBonus => "claim_daily_bonus",
            Self::RedeemCode { .. } => "redeem_code",
            Self::PurchaseShopItem { .. } => "purchase_shop_item",
            Self::CloseMonth { .. } => "close_month",
            Self::ResetAll { .. } => "reset_all",
        }
    }

    /// Confirmation gates, checked before any transform runs.
    fn check_confirmation(&self) -> Result<()> {
        let action = match self {
            Self::DeleteBudget { confirmation, .. } if !confirmation.confirmed() => {
                "delete budget permanently"
            }
            Self::ResetAll { confirmation } if !confirmation.confirmed() => "reset all data",
            Self::CloseMonth { confirmed: false } => "close month",
            _ => return Ok(()),
        };
        Err(Error::ConfirmationRequired {
            action: action.to_string(),
        })
    }
}

/// The reference instant and rules a mutation is applied under.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// The user's wall-clock instant; stored timestamps use its UTC value
    /// and calendar predicates use its offset
    pub as_of: DateTime<FixedOffset>,
    /// Gamification constants
    pub rules: &'a GameRules,
}

/// Mutation-specific result surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase", tag = "effect")]
pub enum Effect {
    /// Nothing beyond the state change
    #[default]
    None,
    /// An entity was created with this id
    Created { id: i64 },
    /// How a confirmed budget expense was recorded
    Recorded(ExpensePlan),
    /// Mustika granted by a redeem code
    Redeemed { amount: f64 },
    /// Line items admitted
    Admitted { count: usize },
    /// Month closed
    MonthClosed(MonthlyCloseReport),
}

/// Result of the post-pass on a state.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Aggregates of the month of `as_of`
    pub summary: MonthlySummary,
    /// Point values after rewards were granted
    pub totals: PointTotals,
    /// Achievement ids unlocked by this evaluation
    pub unlocked: Vec<&'static str>,
    /// Levels whose reward was granted by this evaluation
    pub levels_granted: Vec<u32>,
}

/// A successfully applied mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The next snapshot
    pub state: AppState,
    /// Aggregates of the next snapshot
    pub summary: MonthlySummary,
    /// Point values of the next snapshot
    pub totals: PointTotals,
    /// Achievement ids unlocked by this mutation
    pub unlocked: Vec<&'static str>,
    /// One-shot message for the first unlock or level-up
    pub notification: Option<String>,
    /// Levels whose reward was granted by this mutation
    pub levels_granted: Vec<u32>,
    /// Mutation-specific result
    pub effect: Effect,
}

const fn is_expense(mutation: &Mutation) -> bool {
    matches!(
        mutation,
        Mutation::AddGeneralExpense { .. }
            | Mutation::AddBudgetExpense { .. }
            | Mutation::ApplyOverageSplit { .. }
            | Mutation::AddDailyExpense { .. }
            | Mutation::AddScannedItems { .. }
    )
}

fn transform(state: &mut AppState, mutation: &Mutation, ctx: &Context<'_>) -> Result<Effect> {
    let as_of = ctx.as_of;
    let effect = match mutation {
        Mutation::CreateBudget(new) => Effect::Created {
            id: create_budget(state, new.clone())?,
        },
        Mutation::UpdateBudget { id, changes } => {
            update_budget(state, *id, changes.clone())?;
            Effect::None
        }
        Mutation::ReorderBudgets { ids } => {
            reorder_budgets(state, ids)?;
            Effect::None
        }
        Mutation::ArchiveBudget { id } => {
            set_archived(state, *id, true)?;
            Effect::None
        }
        Mutation::RestoreBudget { id } => {
            set_archived(state, *id, false)?;
            Effect::None
        }
        Mutation::DeleteBudget { id, .. } => {
            delete_budget(state, *id)?;
            Effect::None
        }
        Mutation::AddIncome { desc, amount } => {
            add_income(state, desc, *amount, as_of)?;
            Effect::None
        }
        Mutation::AddGeneralExpense { desc, amount } => {
            add_general_expense(state, desc, *amount, as_of)?;
            Effect::None
        }
        Mutation::AddBudgetExpense {
            budget_id,
            desc,
            amount,
        } => {
            add_budget_expense(state, *budget_id, desc, *amount, as_of)?;
            Effect::None
        }
        Mutation::ApplyOverageSplit {
            budget_id,
            desc,
            amount,
        } => Effect::Recorded(apply_overage_split(state, *budget_id, desc, *amount, as_of)?),
        Mutation::AddDailyExpense { desc, amount } => {
            add_daily_expense(state, desc, *amount, None, as_of)?;
            Effect::None
        }
        Mutation::AddScannedItems { items, budget_id } => Effect::Admitted {
            count: admit_line_items(state, items.clone(), *budget_id, as_of)?,
        },
        Mutation::EditTransaction {
            location,
            desc,
            amount,
        } => {
            edit_transaction(state, *location, desc.as_deref(), *amount)?;
            Effect::None
        }
        Mutation::DeleteTransaction { location } => {
            delete_transaction(state, *location)?;
            Effect::None
        }
        Mutation::CreateSavingsGoal(goal) => Effect::Created {
            id: create_goal(state, goal.clone(), as_of)?,
        },
        Mutation::AddSaving { goal_id, amount } => {
            add_saving(state, *goal_id, *amount, as_of)?;
            Effect::None
        }
        Mutation::WithdrawSaving { goal_id, amount } => {
            withdraw_saving(state, *goal_id, *amount, as_of)?;
            Effect::None
        }
        Mutation::DeleteSavingsGoal { goal_id, refund } => {
            delete_goal(state, *goal_id, *refund, as_of)?;
            Effect::None
        }
        Mutation::AddDebt(debt) => Effect::Created {
            id: add_debt(state, debt.clone(), as_of)?,
        },
        Mutation::RecordDebtPayment {
            debt_id,
            amount,
            note,
            sync_wallet,
        } => {
            record_payment(state, *debt_id, *amount, note, *sync_wallet, as_of)?;
            Effect::None
        }
        Mutation::DeleteDebt { debt_id } => {
            delete_debt(state, *debt_id)?;
            Effect::None
        }
        Mutation::UpsertAsset { id, name, value } => Effect::Created {
            id: upsert_asset(state, *id, name, *value)?,
        },
        Mutation::RemoveAsset { id } => {
            remove_asset(state, *id)?;
            Effect::None
        }
        Mutation::RecordAppOpen => {
            if record_app_open(&mut state.achievement_data, as_of.date_naive()) {
                state.profile.accumulated_xp += ctx.rules.xp_per_app_open;
            }
            Effect::None
        }
        Mutation::ClaimDailyBonus => {
            claim_daily_bonus(state, as_of, ctx.rules)?;
            Effect::None
        }
        Mutation::RedeemCode { code } => Effect::Redeemed {
            amount: redeem_code(state, code, ctx.rules)?,
        },
        Mutation::PurchaseShopItem { item_id } => {
            purchase_item(state, item_id, as_of, ctx.rules)?;
            Effect::None
        }
        Mutation::CloseMonth { .. } => Effect::MonthClosed(close_month(state, as_of)),
        Mutation::ResetAll { .. } => {
            reset_all(state);
            Effect::None
        }
    };

    let recorded = match (&effect, mutation) {
        (Effect::Admitted { count }, _) => *count,
        (_, Mutation::AddIncome { .. }) => 1,
        (_, m) if is_expense(m) => 1,
        _ => 0,
    };
    if recorded > 0 {
        #[allow(clippy::cast_precision_loss)]
        let xp = ctx.rules.xp_per_transaction * recorded as f64;
        state.profile.accumulated_xp += xp;
    }
    if is_expense(mutation) {
        record_expense(&mut state.achievement_data, as_of, ctx.rules.morning_cutoff_hour);
    }
    Ok(effect)
}

/// Runs the post-pass on `state`: streak resets, achievement unlocks and
/// level rewards. Running it again on its own output changes nothing.
pub fn evaluate(state: &mut AppState, ctx: &Context<'_>) -> Evaluation {
    let summary = summarize(state, ctx.as_of);
    reset_violated(&mut state.achievement_data, &summary);

    let unlocked: Vec<&'static str> = newly_satisfied(state, &summary)
        .into_iter()
        .map(|a| a.id)
        .collect();
    for id in &unlocked {
        state
            .profile
            .unlocked_achievements
            .insert((*id).to_string(), ctx.as_of.to_utc());
    }

    let level = point_totals(state, &summary, ctx.as_of, ctx.rules).level;
    let levels_granted = grant_level_rewards(state, level, ctx.rules.level_reward);
    let totals = point_totals(state, &summary, ctx.as_of, ctx.rules);

    Evaluation {
        summary,
        totals,
        unlocked,
        levels_granted,
    }
}

fn notification_for(unlocked: &[&'static str], levels_granted: &[u32]) -> Option<String> {
    if let Some(achievement) = unlocked
        .first()
        .and_then(|id| crate::core::achievements::find(id))
    {
        return Some(format!("Achievement unlocked: {}", achievement.name));
    }
    levels_granted
        .last()
        .map(|level| format!("Level up! You reached level {level}"))
}

/// Applies `mutation` to a copy of `state`.
///
/// Confirmation gates run first, then the mutation transforms a clone of the
/// state. On app open the daily check runs before evaluation. Evaluation then
/// recomputes the aggregates, unlocks achievements and grants level rewards,
/// so the returned state is always settled.
///
/// # Arguments
///
/// * `state` - The current snapshot; never modified
/// * `mutation` - The user intent to apply
/// * `ctx` - The wall-clock instant and the gamification constants
///
/// # Returns
///
/// The next state with its summary, point totals, newly unlocked
/// achievements, granted levels, the mutation's effect and an optional
/// one-shot notification.
///
/// # Errors
///
/// Any validation, lookup, funds or confirmation failure. The input state is
/// never modified.
pub fn apply(state: &AppState, mutation: &Mutation, ctx: &Context<'_>) -> Result<Outcome> {
    mutation.check_confirmation()?;

    let mut next = state.clone();
    let effect = transform(&mut next, mutation, ctx)?;

    if matches!(mutation, Mutation::RecordAppOpen) {
        let summary = summarize(&next, ctx.as_of);
        run_daily_check(&mut next, &summary, ctx.as_of);
    }

    let evaluation = evaluate(&mut next, ctx);
    let notification = notification_for(&evaluation.unlocked, &evaluation.levels_granted);
    if !evaluation.unlocked.is_empty() || !evaluation.levels_granted.is_empty() {
        info!(
            "{}: unlocked {:?}, levels {:?}",
            mutation.name(),
            evaluation.unlocked,
            evaluation.levels_granted
        );
    }
    debug!(
        "Applied {} (remaining {:.0})",
        mutation.name(),
        evaluation.summary.total_remaining
    );

    Ok(Outcome {
        state: next,
        summary: evaluation.summary,
        totals: evaluation.totals,
        unlocked: evaluation.unlocked,
        notification,
        levels_granted: evaluation.levels_granted,
        effect,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::at;

    fn run(state: &AppState, mutation: Mutation, as_of: DateTime<FixedOffset>) -> Result<Outcome> {
        let rules = GameRules::default();
        apply(state, &mutation, &Context { as_of, rules: &rules })
    }

    fn income(desc: &str, amount: f64) -> Mutation {
        Mutation::AddIncome {
            desc: desc.to_string(),
            amount,
        }
    }

    fn food_budget() -> Mutation {
        Mutation::CreateBudget(NewBudget {
            name: "Food".to_string(),
            total_budget: 200_000.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_overage_scenario() {
        let now = at(2025, 3, 10, 12);
        let state = run(&AppState::default(), income("Salary", 1_000_000.0), now)
            .unwrap()
            .state;
        let created = run(&state, food_budget(), now).unwrap();
        let Effect::Created { id } = created.effect else {
            panic!("expected created effect");
        };
        let state = created.state;

        let expense = Mutation::AddBudgetExpense {
            budget_id: id,
            desc: "Party".to_string(),
            amount: 250_000.0,
        };
        let err = run(&state, expense, now).unwrap_err();
        assert!(matches!(err, Error::OverageRequiresConfirmation { .. }));

        let confirmed = Mutation::ApplyOverageSplit {
            budget_id: id,
            desc: "Party".to_string(),
            amount: 250_000.0,
        };
        let outcome = run(&state, confirmed, now).unwrap();
        let food = outcome.state.budget(id).unwrap();
        assert_eq!(food.history.len(), 1);
        assert_eq!(food.history[0].amount, 200_000.0);
        assert_eq!(outcome.state.daily_expenses.len(), 1);
        assert_eq!(outcome.state.daily_expenses[0].amount, 50_000.0);
        assert_eq!(
            outcome.state.daily_expenses[0].source_category.as_deref(),
            Some("Food")
        );
        assert_eq!(outcome.summary.total_used_overall, 250_000.0);
        assert_eq!(outcome.summary.total_remaining, 750_000.0);
    }

    #[test]
    fn test_rejected_mutation_leaves_state_untouched() {
        let now = at(2025, 3, 10, 12);
        let state = run(&AppState::default(), income("Salary", 100.0), now)
            .unwrap()
            .state;
        let before = state.clone();
        assert!(run(&state, income("Bad", -5.0), now).is_err());
        let missing = Mutation::AddSaving {
            goal_id: 77,
            amount: 1.0,
        };
        assert!(matches!(
            run(&state, missing, now),
            Err(Error::GoalNotFound { id: 77 })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_confirmation_gates() {
        let now = at(2025, 3, 31, 20);
        let state = AppState::default();
        assert!(matches!(
            run(&state, Mutation::CloseMonth { confirmed: false }, now),
            Err(Error::ConfirmationRequired { .. })
        ));
        let half = DoubleConfirmation {
            first: true,
            second: false,
        };
        assert!(run(&state, Mutation::ResetAll { confirmation: half }, now).is_err());
        assert!(
            run(
                &state,
                Mutation::ResetAll {
                    confirmation: DoubleConfirmation::both()
                },
                now
            )
            .is_ok()
        );
    }

    #[test]
    fn test_monthly_streak_resets_synchronously() {
        let now = at(2025, 3, 10, 12);
        let mut state = run(&AppState::default(), income("Salary", 100.0), now)
            .unwrap()
            .state;
        state.achievement_data.monthly_streak = 3;
        let outcome = run(
            &state,
            Mutation::AddGeneralExpense {
                desc: "Rent".to_string(),
                amount: 150.0,
            },
            now,
        )
        .unwrap();
        assert!(outcome.summary.total_remaining < 0.0);
        assert_eq!(outcome.state.achievement_data.monthly_streak, 0);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let now = at(2025, 3, 10, 12);
        let rules = GameRules::default();
        let ctx = Context { as_of: now, rules: &rules };
        let outcome = apply(&AppState::default(), &income("Salary", 10.0), &ctx).unwrap();
        assert!(outcome.unlocked.contains(&"first_income"));

        let mut again = outcome.state.clone();
        let evaluation = evaluate(&mut again, &ctx);
        assert!(evaluation.unlocked.is_empty());
        assert!(evaluation.levels_granted.is_empty());
        assert_eq!(again, outcome.state);
    }

    #[test]
    fn test_level_crossing_grants_reward_once() {
        let now = at(2025, 3, 10, 12);
        let rules = GameRules::default();
        let ctx = Context { as_of: now, rules: &rules };
        // 10 quest points (within quota) + 39 passive XP = 49
        let mut state = AppState::default();
        state.profile.accumulated_xp = 39.0;
        let first = evaluate(&mut state, &ctx);
        assert_eq!(first.totals.total_xp, 49.0);
        assert_eq!(first.totals.level, 1);

        state.profile.accumulated_xp = 41.0;
        let second = evaluate(&mut state, &ctx);
        assert_eq!(second.totals.level, 2);
        assert_eq!(second.levels_granted, vec![2]);
        assert_eq!(state.profile.level_rewards_claimed, vec![2]);

        let third = evaluate(&mut state, &ctx);
        assert!(third.levels_granted.is_empty());
        assert_eq!(state.profile.level_reward_points, rules.level_reward);
    }

    #[test]
    fn test_app_open_runs_daily_check_and_awards_xp() {
        let now = at(2025, 3, 10, 8);
        let outcome = run(&AppState::default(), Mutation::RecordAppOpen, now).unwrap();
        let data = &outcome.state.achievement_data;
        assert_eq!(data.app_open_streak, 1);
        assert_eq!(data.last_daily_check, Some(now.date_naive()));
        assert_eq!(outcome.state.profile.accumulated_xp, 2.0);

        let again = run(&outcome.state, Mutation::RecordAppOpen, now).unwrap();
        assert_eq!(again.state.profile.accumulated_xp, 2.0);
    }

    #[test]
    fn test_close_month_through_engine() {
        let now = at(2025, 3, 31, 20);
        let state = run(&AppState::default(), income("Salary", 500.0), now)
            .unwrap()
            .state;
        let outcome = run(&state, Mutation::CloseMonth { confirmed: true }, now).unwrap();
        let Effect::MonthClosed(report) = outcome.effect else {
            panic!("expected month close");
        };
        assert_eq!(report.archived_count, 1);
        assert!(outcome.state.fund_history.is_empty());
        assert_eq!(outcome.state.achievement_data.monthly_streak, 1);
    }

    fn scanned(budget_id: i64, amounts: &[f64]) -> Mutation {
        Mutation::AddScannedItems {
            items: amounts
                .iter()
                .map(|amount| LineItem {
                    desc: "Receipt line".to_string(),
                    amount: *amount,
                    category: None,
                })
                .collect(),
            budget_id: Some(budget_id),
        }
    }

    #[test]
    fn test_scanned_items_follow_budget_rules() {
        let now = at(2025, 3, 10, 12);
        let state = run(&AppState::default(), income("Salary", 1_000_000.0), now)
            .unwrap()
            .state;
        let state = run(&state, food_budget(), now).unwrap().state;

        let within = run(&state, scanned(1, &[120_000.25, 79_999.75]), now).unwrap();
        assert_eq!(within.effect, Effect::Admitted { count: 2 });
        assert_eq!(within.summary.total_remaining, 800_000.0);

        let over = run(&within.state, scanned(1, &[0.5]), now);
        assert!(matches!(
            over,
            Err(Error::OverageRequiresConfirmation { remaining, .. }) if remaining == 0.0
        ));

        let archived = run(&state, Mutation::ArchiveBudget { id: 1 }, now)
            .unwrap()
            .state;
        let into_archived = run(&archived, scanned(1, &[10.0]), now);
        assert!(matches!(into_archived, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_mutation_wire_format() {
        let json = r#"{"type":"addBudgetExpense","budgetId":3,"desc":"Lunch","amount":12.5}"#;
        let mutation: Mutation = serde_json::from_str(json).unwrap();
        assert_eq!(
            mutation,
            Mutation::AddBudgetExpense {
                budget_id: 3,
                desc: "Lunch".to_string(),
                amount: 12.5,
            }
        );
        assert_eq!(mutation.name(), "add_budget_expense");
    }
}
