//! Achievement catalog and the unlock evaluator.
//!
//! Conditions are a closed set of predicate kinds with parameters rather than
//! stored closures, so the catalog is plain data. Evaluation is total and
//! side-effect free; the engine merges the result into the profile. Unlocks
//! are monotonic: an unlocked achievement is never re-checked or revoked.

use crate::core::aggregate::{MonthlySummary, net_worth};
use crate::core::state::{Amount, AppState, ArchivedKind, StreakKey};
use serde::Serialize;

/// What has to be true for an achievement to unlock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// Lifetime expense entries (live and archived) reach the count
    TransactionCount(usize),
    /// Any income has ever been recorded
    IncomeRecorded,
    /// Number of non-archived budgets reaches the count
    BudgetCount(usize),
    /// At least one savings goal exists
    GoalCreated,
    /// Number of completed savings goals reaches the count
    GoalsCompleted(usize),
    /// Net worth reaches the amount
    NetWorthAtLeast(Amount),
    /// A streak counter reaches the target
    Streak {
        /// Which counter
        key: StreakKey,
        /// Required length
        target: u32,
    },
    /// Number of archived months reaches the count
    MonthsClosed(usize),
    /// Number of paid-off debts reaches the count
    DebtsPaidOff(usize),
    /// Lifetime admitted receipt items reach the count
    ReceiptsScanned(u32),
    /// Number of shop items owned reaches the count
    ShopPurchases(usize),
}

/// Progress toward a condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    /// Where the user is now
    pub current: f64,
    /// Where the condition is met
    pub target: f64,
}

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Achievement {
    /// Stable id, used as the unlock-record key
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Display description
    pub description: &'static str,
    /// Unlock condition
    pub condition: Condition,
    /// Points credited to the achievement pool
    pub points: f64,
}

/// Every achievement the app knows about.
pub const CATALOG: &[Achievement] = &[
    Achievement {
        id: "first_step",
        name: "First Step",
        description: "Record your first expense",
        condition: Condition::TransactionCount(1),
        points: 10.0,
    },
    Achievement {
        id: "diligent_recorder",
        name: "Diligent Recorder",
        description: "Record 50 expenses",
        condition: Condition::TransactionCount(50),
        points: 50.0,
    },
    Achievement {
        id: "ledger_master",
        name: "Ledger Master",
        description: "Record 200 expenses",
        condition: Condition::TransactionCount(200),
        points: 150.0,
    },
    Achievement {
        id: "first_income",
        name: "Payday",
        description: "Record your first income",
        condition: Condition::IncomeRecorded,
        points: 10.0,
    },
    Achievement {
        id: "planner",
        name: "Planner",
        description: "Keep three active budgets",
        condition: Condition::BudgetCount(3),
        points: 20.0,
    },
    Achievement {
        id: "saver_starter",
        name: "Saver Starter",
        description: "Create a savings goal",
        condition: Condition::GoalCreated,
        points: 10.0,
    },
    Achievement {
        id: "goal_getter",
        name: "Goal Getter",
        description: "Complete a savings goal",
        condition: Condition::GoalsCompleted(1),
        points: 50.0,
    },
    Achievement {
        id: "dream_chaser",
        name: "Dream Chaser",
        description: "Complete five savings goals",
        condition: Condition::GoalsCompleted(5),
        points: 150.0,
    },
    Achievement {
        id: "net_worth_1m",
        name: "Millionaire",
        description: "Reach a net worth of 1,000,000",
        condition: Condition::NetWorthAtLeast(1_000_000.0),
        points: 100.0,
    },
    Achievement {
        id: "net_worth_10m",
        name: "Tycoon",
        description: "Reach a net worth of 10,000,000",
        condition: Condition::NetWorthAtLeast(10_000_000.0),
        points: 300.0,
    },
    Achievement {
        id: "daily_disciplined",
        name: "Disciplined",
        description: "Stay within the daily quota for 7 days",
        condition: Condition::Streak {
            key: StreakKey::DailyStreak,
            target: 7,
        },
        points: 50.0,
    },
    Achievement {
        id: "monthly_master",
        name: "Monthly Master",
        description: "Close 3 months in a row without going negative",
        condition: Condition::Streak {
            key: StreakKey::MonthlyStreak,
            target: 3,
        },
        points: 150.0,
    },
    Achievement {
        id: "frugal_days",
        name: "Frugal",
        description: "Spend nothing for 3 days in a row",
        condition: Condition::Streak {
            key: StreakKey::NoSpendStreak,
            target: 3,
        },
        points: 30.0,
    },
    Achievement {
        id: "loyal_user",
        name: "Loyal",
        description: "Open the app 7 days in a row",
        condition: Condition::Streak {
            key: StreakKey::AppOpenStreak,
            target: 7,
        },
        points: 30.0,
    },
    Achievement {
        id: "devoted_user",
        name: "Devoted",
        description: "Open the app 30 days in a row",
        condition: Condition::Streak {
            key: StreakKey::AppOpenStreak,
            target: 30,
        },
        points: 100.0,
    },
    Achievement {
        id: "early_bird",
        name: "Early Bird",
        description: "Record a morning transaction 5 days in a row",
        condition: Condition::Streak {
            key: StreakKey::MorningTransactionStreak,
            target: 5,
        },
        points: 40.0,
    },
    Achievement {
        id: "consistent_saver",
        name: "Consistent Saver",
        description: "Save something 7 days in a row",
        condition: Condition::Streak {
            key: StreakKey::SavingStreak,
            target: 7,
        },
        points: 60.0,
    },
    Achievement {
        id: "book_closer",
        name: "Book Closer",
        description: "Close your first month",
        condition: Condition::MonthsClosed(1),
        points: 30.0,
    },
    Achievement {
        id: "debt_free",
        name: "Debt Free",
        description: "Pay off a debt",
        condition: Condition::DebtsPaidOff(1),
        points: 40.0,
    },
    Achievement {
        id: "receipt_scanner",
        name: "Receipt Scanner",
        description: "Admit 10 scanned receipt items",
        condition: Condition::ReceiptsScanned(10),
        points: 30.0,
    },
    Achievement {
        id: "collector",
        name: "Collector",
        description: "Buy something in the shop",
        condition: Condition::ShopPurchases(1),
        points: 20.0,
    },
];

/// Looks up a catalog entry.
#[must_use]
pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.id == id)
}

/// Lifetime expense entries: live budget and daily entries plus archived ones.
fn lifetime_expense_count(state: &AppState) -> usize {
    let live = state.daily_expenses.len()
        + state.budgets.iter().map(|b| b.history.len()).sum::<usize>();
    let archived = state
        .archives
        .iter()
        .flat_map(|a| a.transactions.iter())
        .filter(|t| matches!(t.kind, ArchivedKind::BudgetExpense | ArchivedKind::DailyExpense))
        .count();
    live + archived
}

fn income_recorded(state: &AppState) -> bool {
    state
        .fund_history
        .iter()
        .any(|t| t.kind == crate::core::state::FundKind::Add)
        || state
            .archives
            .iter()
            .flat_map(|a| a.transactions.iter())
            .any(|t| t.kind == ArchivedKind::Income)
}

#[allow(clippy::cast_precision_loss)]
fn count_progress(current: usize, target: usize) -> Progress {
    Progress {
        current: current as f64,
        target: target as f64,
    }
}

fn flag_progress(done: bool) -> Progress {
    Progress {
        current: if done { 1.0 } else { 0.0 },
        target: 1.0,
    }
}

impl Condition {
    /// Progress toward the condition on the given state.
    #[must_use]
    pub fn progress(&self, state: &AppState, summary: &MonthlySummary) -> Progress {
        match *self {
            Self::TransactionCount(n) => count_progress(lifetime_expense_count(state), n),
            Self::IncomeRecorded => flag_progress(income_recorded(state)),
            Self::BudgetCount(n) => count_progress(state.active_budgets().count(), n),
            Self::GoalCreated => flag_progress(!state.savings_goals.is_empty()),
            Self::GoalsCompleted(n) => count_progress(
                state.savings_goals.iter().filter(|g| g.is_completed).count(),
                n,
            ),
            Self::NetWorthAtLeast(target) => Progress {
                current: net_worth(state, summary),
                target,
            },
            Self::Streak { key, target } => Progress {
                current: f64::from(state.achievement_data.streak(key)),
                target: f64::from(target),
            },
            Self::MonthsClosed(n) => count_progress(state.archives.len(), n),
            Self::DebtsPaidOff(n) => {
                count_progress(state.debts.iter().filter(|d| d.is_paid_off).count(), n)
            }
            Self::ReceiptsScanned(n) => Progress {
                current: f64::from(state.achievement_data.scanned_receipts),
                target: f64::from(n),
            },
            Self::ShopPurchases(n) => count_progress(state.profile.inventory.len(), n),
        }
    }

    /// Whether the condition holds on the given state.
    #[must_use]
    pub fn is_met(&self, state: &AppState, summary: &MonthlySummary) -> bool {
        let p = self.progress(state, summary);
        p.current >= p.target
    }
}

/// Catalog entries not yet unlocked whose condition now holds, in catalog order.
#[must_use]
pub fn newly_satisfied(state: &AppState, summary: &MonthlySummary) -> Vec<&'static Achievement> {
    CATALOG
        .iter()
        .filter(|a| !state.profile.unlocked_achievements.contains_key(a.id))
        .filter(|a| a.condition.is_met(state, summary))
        .collect()
}

/// Sum of the points of every unlocked achievement. Unknown ids (from an
/// older catalog) contribute nothing.
#[must_use]
pub fn achievement_points(state: &AppState) -> f64 {
    state
        .profile
        .unlocked_achievements
        .keys()
        .filter_map(|id| find(id))
        .map(|a| a.points)
        .sum()
}
