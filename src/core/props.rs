//! Property-based tests for the ledger invariants.
//!
//! Random mutation sequences are pushed through the engine; rejected
//! mutations are skipped, exactly as the store does.

#![allow(clippy::unwrap_used)]
#![allow(clippy::float_cmp)]

use proptest::prelude::*;

use super::budget::NewBudget;
use super::engine::{Context, Mutation, apply, evaluate};
use super::rules::GameRules;
use super::savings::NewGoal;
use super::state::AppState;
use crate::storage::export::{decode_backup, encode_backup};
use crate::test_utils::at;
use chrono::{DateTime, FixedOffset};

/// Whole-unit amounts, as the app stores them.
fn amount() -> BoxedStrategy<f64> {
    (1u32..2_000_000u32).prop_map(f64::from).boxed()
}

/// Arbitrary fractional amounts, as typed or imported.
fn fractional_amount() -> BoxedStrategy<f64> {
    (0.001f64..2_000_000.0).boxed()
}

fn desc() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn mutation() -> impl Strategy<Value = Mutation> {
    mutation_with(amount())
}

fn mutation_with(amounts: BoxedStrategy<f64>) -> impl Strategy<Value = Mutation> {
    let amount = move || amounts.clone();
    prop_oneof![
        (desc(), amount()).prop_map(|(desc, amount)| Mutation::AddIncome { desc, amount }),
        (desc(), amount())
            .prop_map(|(desc, amount)| Mutation::AddGeneralExpense { desc, amount }),
        (desc(), amount()).prop_map(|(desc, amount)| Mutation::AddDailyExpense { desc, amount }),
        (desc(), amount()).prop_map(|(name, total_budget)| Mutation::CreateBudget(NewBudget {
            name,
            total_budget,
            ..Default::default()
        })),
        (1i64..4, desc(), amount()).prop_map(|(budget_id, desc, amount)| {
            Mutation::ApplyOverageSplit {
                budget_id,
                desc,
                amount,
            }
        }),
        (1i64..4, desc(), amount()).prop_map(|(budget_id, desc, amount)| {
            Mutation::AddBudgetExpense {
                budget_id,
                desc,
                amount,
            }
        }),
        (desc(), proptest::option::of(amount())).prop_map(|(name, target_amount)| {
            Mutation::CreateSavingsGoal(NewGoal {
                name,
                target_amount,
            })
        }),
        (1i64..3, amount()).prop_map(|(goal_id, amount)| Mutation::AddSaving { goal_id, amount }),
        (1i64..3, amount())
            .prop_map(|(goal_id, amount)| Mutation::WithdrawSaving { goal_id, amount }),
        Just(Mutation::RecordAppOpen),
    ]
}

/// A timestamp inside May 2025.
fn instant() -> impl Strategy<Value = DateTime<FixedOffset>> {
    (1u32..29, 0u32..24).prop_map(|(day, hour)| at(2025, 5, day, hour))
}

fn run_sequence(steps: &[(Mutation, DateTime<FixedOffset>)], rules: &GameRules) -> AppState {
    let mut state = AppState::default();
    for (mutation, as_of) in steps {
        let ctx = Context {
            as_of: *as_of,
            rules,
        };
        if let Ok(outcome) = apply(&state, mutation, &ctx) {
            state = outcome.state;
        }
    }
    state
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The available-funds clamp holds after every accepted mutation.
    #[test]
    fn prop_available_funds_never_exceed_remaining(
        steps in prop::collection::vec((mutation(), instant()), 1..40),
    ) {
        let rules = GameRules::default();
        let mut state = AppState::default();
        for (mutation, as_of) in &steps {
            let ctx = Context { as_of: *as_of, rules: &rules };
            if let Ok(outcome) = apply(&state, mutation, &ctx) {
                prop_assert!(
                    outcome.summary.current_available_funds <= outcome.summary.total_remaining
                );
                state = outcome.state;
            }
        }
    }

    /// Saved amounts always equal the signed history and never go negative.
    #[test]
    fn prop_savings_track_history(
        steps in prop::collection::vec((mutation(), instant()), 1..40),
    ) {
        let state = run_sequence(&steps, &GameRules::default());
        for goal in &state.savings_goals {
            prop_assert_eq!(goal.saved_amount, goal.history_total());
            prop_assert!(goal.saved_amount >= 0.0);
        }
    }

    /// A rejected mutation never changes the input state.
    #[test]
    fn prop_rejections_are_no_ops(
        steps in prop::collection::vec((mutation(), instant()), 1..30),
        last in mutation(),
        as_of in instant(),
    ) {
        let rules = GameRules::default();
        let state = run_sequence(&steps, &rules);
        let before = state.clone();
        let ctx = Context { as_of, rules: &rules };
        if apply(&state, &last, &ctx).is_err() {
            prop_assert_eq!(state, before);
        }
    }

    /// Closing the month empties every open ledger into one archive.
    #[test]
    fn prop_close_month_archives_everything(
        steps in prop::collection::vec((mutation(), instant()), 1..40),
    ) {
        let rules = GameRules::default();
        let state = run_sequence(&steps, &rules);
        let open = state.open_transaction_count();
        let ctx = Context { as_of: at(2025, 5, 31, 23), rules: &rules };

        let closed = apply(&state, &Mutation::CloseMonth { confirmed: true }, &ctx)
            .unwrap()
            .state;
        prop_assert!(closed.fund_history.is_empty());
        prop_assert!(closed.daily_expenses.is_empty());
        prop_assert_eq!(closed.open_transaction_count(), 0);
        prop_assert_eq!(closed.archives.last().unwrap().transactions.len(), open);
    }

    /// A second evaluation never unlocks or grants anything.
    #[test]
    fn prop_evaluation_is_idempotent(
        steps in prop::collection::vec((mutation(), instant()), 1..30),
        as_of in instant(),
    ) {
        let rules = GameRules::default();
        let mut state = run_sequence(&steps, &rules);
        let ctx = Context { as_of, rules: &rules };
        evaluate(&mut state, &ctx);
        let settled = state.clone();
        let again = evaluate(&mut state, &ctx);
        prop_assert!(again.unlocked.is_empty());
        prop_assert!(again.levels_granted.is_empty());
        prop_assert_eq!(state, settled);
    }

    /// Export then import gives back the same state, fractional amounts included.
    #[test]
    fn prop_backup_round_trip(
        steps in prop::collection::vec((mutation_with(fractional_amount()), instant()), 1..30),
        secret in "[ -~]{1,24}",
    ) {
        let state = run_sequence(&steps, &GameRules::default());
        let encoded = encode_backup(&state, "3.0", &secret).unwrap();
        let decoded = decode_backup(&encoded, &secret).unwrap();
        prop_assert_eq!(decoded, state);
    }
}
