//! Ledger Store - the canonical state tree.
//!
//! Pure data plus the small helpers that keep per-entity invariants in one
//! place. Field names serialize in camelCase so the persisted JSON keeps the
//! shape used by existing backups, and every field has a serde default so
//! older snapshots load with missing fields backfilled.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Currency amount in whole units. Stored amounts are always finite and `>= 0`.
pub type Amount = f64;

/// A spend recorded against a budget envelope or in the daily-expense list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    /// Free-text description
    pub desc: String,
    /// Non-negative amount
    pub amount: Amount,
    /// When the spend happened
    pub timestamp: DateTime<Utc>,
    /// Budget name the amount overflowed from, for split overage entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_category: Option<String>,
}

/// Direction of a fund-history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FundKind {
    /// Income
    #[default]
    Add,
    /// General outflow not tied to a budget
    Remove,
}

/// Income or general outflow in the top-level fund history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FundTransaction {
    /// Direction
    #[serde(rename = "type")]
    pub kind: FundKind,
    /// Free-text description
    pub desc: String,
    /// Non-negative amount
    pub amount: Amount,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

/// A spending envelope with a monthly quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Budget {
    /// Unique identifier
    pub id: i64,
    /// Display name, also used as `source_category` for overage entries
    pub name: String,
    /// Monthly quota
    pub total_budget: Amount,
    /// Append-ordered spend history
    pub history: Vec<Transaction>,
    /// Icon name for the UI
    pub icon: String,
    /// Color for the UI
    pub color: String,
    /// Display order
    pub order: i64,
    /// Soft-archived budgets are hidden and excluded from allocation
    pub is_archived: bool,
    /// Temporary budgets are archived when the month is closed
    pub is_temporary: bool,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            total_budget: 0.0,
            history: Vec::new(),
            icon: "wallet".to_string(),
            color: "#6366f1".to_string(),
            order: 0,
            is_archived: false,
            is_temporary: false,
        }
    }
}

/// Direction of a savings movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SavingKind {
    /// Contribution into the goal
    #[default]
    Add,
    /// Withdrawal back to the fund
    Withdraw,
}

/// One contribution or withdrawal on a savings goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SavingTransaction {
    /// Direction
    #[serde(rename = "type")]
    pub kind: SavingKind,
    /// Non-negative amount
    pub amount: Amount,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl SavingTransaction {
    /// Amount with the direction applied.
    #[must_use]
    pub fn signed_amount(&self) -> Amount {
        match self.kind {
            SavingKind::Add => self.amount,
            SavingKind::Withdraw => -self.amount,
        }
    }
}

/// A savings goal. `saved_amount` is a running total kept equal to the
/// signed sum of `history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SavingsGoal {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Target, absent for infinite goals
    pub target_amount: Option<Amount>,
    /// Open-ended goal with no completion
    pub is_infinite: bool,
    /// Running total
    pub saved_amount: Amount,
    /// Contributions and withdrawals
    pub history: Vec<SavingTransaction>,
    /// Whether the target has been reached
    pub is_completed: bool,
    /// Creation instant
    pub created_at: DateTime<Utc>,
}

impl SavingsGoal {
    /// Signed sum of the history.
    #[must_use]
    pub fn history_total(&self) -> Amount {
        self.history.iter().map(SavingTransaction::signed_amount).sum()
    }

    /// Re-derives `saved_amount` and `is_completed` from the history.
    pub fn recompute(&mut self) {
        self.saved_amount = self.history_total();
        self.is_completed = !self.is_infinite
            && self
                .target_amount
                .is_some_and(|target| self.saved_amount >= target);
    }
}

/// Which side of a debt the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DebtKind {
    /// The user owes someone
    #[default]
    Borrowed,
    /// Someone owes the user
    Lent,
}

/// One repayment on a debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DebtRecord {
    /// Non-negative amount
    pub amount: Amount,
    /// When it was paid
    pub timestamp: DateTime<Utc>,
    /// Optional note
    pub note: String,
}

/// A borrowed or lent amount and its repayments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Debt {
    /// Unique identifier
    pub id: i64,
    /// Direction
    #[serde(rename = "type")]
    pub kind: DebtKind,
    /// Counterparty
    pub person: String,
    /// Principal
    pub amount: Amount,
    /// Repaid so far
    pub paid: Amount,
    /// Repayments
    pub history: Vec<DebtRecord>,
    /// `paid >= amount`
    pub is_paid_off: bool,
}

impl Debt {
    /// Amount still open.
    #[must_use]
    pub fn outstanding(&self) -> Amount {
        (self.amount - self.paid).max(0.0)
    }

    /// Re-derives `paid` and `is_paid_off` from the repayment history.
    pub fn recompute(&mut self) {
        self.paid = self.history.iter().map(|r| r.amount).sum();
        self.is_paid_off = self.paid >= self.amount;
    }
}

/// Something the user owns outside the monthly ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Asset {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Current value
    pub value: Amount,
}

/// Origin of an archived transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ArchivedKind {
    /// Fund-history add
    #[default]
    Income,
    /// Fund-history remove
    GeneralExpense,
    /// Budget history entry
    BudgetExpense,
    /// Daily-expense entry
    DailyExpense,
}

/// A transaction frozen into a closed month, with display metadata preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchivedTransaction {
    /// Free-text description
    pub desc: String,
    /// Non-negative amount
    pub amount: Amount,
    /// Original timestamp
    pub timestamp: DateTime<Utc>,
    /// Origin collection
    #[serde(rename = "type")]
    pub kind: ArchivedKind,
    /// Category label (budget name, source category, or a fixed label)
    pub category: String,
    /// Icon of the source budget, if any
    pub icon: String,
    /// Color of the source budget, if any
    pub color: String,
}

/// An immutable closed accounting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Archive {
    /// `YYYY-MM`
    pub month: String,
    /// Everything recorded during the month
    pub transactions: Vec<ArchivedTransaction>,
}

/// Streak counters and the bookkeeping needed to advance them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AchievementData {
    /// Consecutive days with a non-negative daily quota
    pub daily_streak: u32,
    /// Consecutive closed months with a non-negative remaining balance
    pub monthly_streak: u32,
    /// Consecutive days without any spending
    pub no_spend_streak: u32,
    /// Consecutive days the app was opened
    pub app_open_streak: u32,
    /// Consecutive days with a transaction before 10:00
    pub morning_transaction_streak: u32,
    /// Consecutive days with a savings contribution
    pub saving_streak: u32,
    /// Last day the app was opened
    pub last_app_open: Option<NaiveDate>,
    /// Last day the daily and no-spend streaks were advanced
    pub last_daily_check: Option<NaiveDate>,
    /// Last day with a morning transaction
    pub last_morning_transaction: Option<NaiveDate>,
    /// Last day with a savings contribution
    pub last_saving: Option<NaiveDate>,
    /// Lifetime app opens
    pub app_opens: u32,
    /// Lifetime admitted receipt line items
    pub scanned_receipts: u32,
}

/// Named streak counters, for achievement conditions and progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreakKey {
    /// `daily_streak`
    DailyStreak,
    /// `monthly_streak`
    MonthlyStreak,
    /// `no_spend_streak`
    NoSpendStreak,
    /// `app_open_streak`
    AppOpenStreak,
    /// `morning_transaction_streak`
    MorningTransactionStreak,
    /// `saving_streak`
    SavingStreak,
}

impl AchievementData {
    /// Current value of a named streak.
    #[must_use]
    pub const fn streak(&self, key: StreakKey) -> u32 {
        match key {
            StreakKey::DailyStreak => self.daily_streak,
            StreakKey::MonthlyStreak => self.monthly_streak,
            StreakKey::NoSpendStreak => self.no_spend_streak,
            StreakKey::AppOpenStreak => self.app_open_streak,
            StreakKey::MorningTransactionStreak => self.morning_transaction_streak,
            StreakKey::SavingStreak => self.saving_streak,
        }
    }
}

/// Gamification counters and point pools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    /// Display name
    pub name: String,
    /// Achievement id to unlock instant; append-only
    pub unlocked_achievements: BTreeMap<String, DateTime<Utc>>,
    /// Manually granted points (daily bonus)
    pub bonus_points: f64,
    /// Points from redeem codes
    pub redeemed_mustika: f64,
    /// Passive XP (transactions, app opens); counts toward level only
    #[serde(rename = "accumulatedXP")]
    pub accumulated_xp: f64,
    /// Lifetime Mustika spent in the shop
    pub spent_points: f64,
    /// Mustika granted by level-ups; spendable only
    pub level_reward_points: f64,
    /// Levels whose reward has been granted
    pub level_rewards_claimed: Vec<u32>,
    /// Codes already redeemed
    pub redeemed_codes: Vec<String>,
    /// Day the daily bonus was last claimed
    pub last_bonus_claim: Option<NaiveDate>,
    /// Purchased shop item ids
    pub inventory: Vec<String>,
}

/// The whole Ledger Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    /// Budget envelopes, archived ones included
    pub budgets: Vec<Budget>,
    /// Income and general outflows
    pub fund_history: Vec<FundTransaction>,
    /// Untracked spend
    pub daily_expenses: Vec<Transaction>,
    /// Savings goals
    pub savings_goals: Vec<SavingsGoal>,
    /// Debts
    pub debts: Vec<Debt>,
    /// Assets
    pub assets: Vec<Asset>,
    /// Closed months
    pub archives: Vec<Archive>,
    /// Streak counters
    pub achievement_data: AchievementData,
    /// Gamification profile
    pub profile: Profile,
}

fn next_id<I: Iterator<Item = i64>>(ids: I) -> i64 {
    ids.max().map_or(1, |max| max + 1)
}

impl AppState {
    /// Looks up a budget by id.
    #[must_use]
    pub fn budget(&self, id: i64) -> Option<&Budget> {
        self.budgets.iter().find(|b| b.id == id)
    }

    /// Looks up a budget by id, mutably.
    pub fn budget_mut(&mut self, id: i64) -> Option<&mut Budget> {
        self.budgets.iter_mut().find(|b| b.id == id)
    }

    /// Looks up a savings goal by id, mutably.
    pub fn goal_mut(&mut self, id: i64) -> Option<&mut SavingsGoal> {
        self.savings_goals.iter_mut().find(|g| g.id == id)
    }

    /// Looks up a debt by id, mutably.
    pub fn debt_mut(&mut self, id: i64) -> Option<&mut Debt> {
        self.debts.iter_mut().find(|d| d.id == id)
    }

    /// Budgets that take part in the current month.
    pub fn active_budgets(&self) -> impl Iterator<Item = &Budget> {
        self.budgets.iter().filter(|b| !b.is_archived)
    }

    /// Id for a new budget.
    #[must_use]
    pub fn next_budget_id(&self) -> i64 {
        next_id(self.budgets.iter().map(|b| b.id))
    }

    /// Id for a new savings goal.
    #[must_use]
    pub fn next_goal_id(&self) -> i64 {
        next_id(self.savings_goals.iter().map(|g| g.id))
    }

    /// Id for a new debt.
    #[must_use]
    pub fn next_debt_id(&self) -> i64 {
        next_id(self.debts.iter().map(|d| d.id))
    }

    /// Id for a new asset.
    #[must_use]
    pub fn next_asset_id(&self) -> i64 {
        next_id(self.assets.iter().map(|a| a.id))
    }

    /// Number of live (not yet archived) transactions across all collections.
    #[must_use]
    pub fn open_transaction_count(&self) -> usize {
        self.fund_history.len()
            + self.daily_expenses.len()
            + self.budgets.iter().map(|b| b.history.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_goal_recompute_tracks_signed_history() {
        let mut goal = SavingsGoal {
            target_amount: Some(500.0),
            history: vec![
                SavingTransaction {
                    kind: SavingKind::Add,
                    amount: 500.0,
                    ..Default::default()
                },
                SavingTransaction {
                    kind: SavingKind::Withdraw,
                    amount: 100.0,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        goal.recompute();
        assert_eq!(goal.saved_amount, 400.0);
        assert!(!goal.is_completed);
    }

    #[test]
    fn test_infinite_goal_never_completes() {
        let mut goal = SavingsGoal {
            is_infinite: true,
            target_amount: Some(10.0),
            history: vec![SavingTransaction {
                amount: 1_000.0,
                ..Default::default()
            }],
            ..Default::default()
        };
        goal.recompute();
        assert!(!goal.is_completed);
    }

    #[test]
    fn test_debt_paid_off_flag() {
        let mut debt = Debt {
            amount: 100.0,
            history: vec![DebtRecord {
                amount: 60.0,
                ..Default::default()
            }],
            ..Default::default()
        };
        debt.recompute();
        assert!(!debt.is_paid_off);
        assert_eq!(debt.outstanding(), 40.0);

        debt.history.push(DebtRecord {
            amount: 40.0,
            ..Default::default()
        });
        debt.recompute();
        assert!(debt.is_paid_off);
    }

    #[test]
    fn test_missing_fields_are_backfilled() {
        let json = r#"{"budgets":[{"id":3,"name":"Food","totalBudget":200000}],"archives":[]}"#;
        let state: AppState = serde_json::from_str(json).unwrap();
        assert_eq!(state.budgets[0].name, "Food");
        assert_eq!(state.budgets[0].icon, "wallet");
        assert!(state.fund_history.is_empty());
        assert_eq!(state.achievement_data.daily_streak, 0);
        assert_eq!(state.next_budget_id(), 4);
    }

    #[test]
    fn test_fund_kind_serializes_as_type_tag() {
        let tx = FundTransaction {
            kind: FundKind::Remove,
            desc: "Rent".to_string(),
            amount: 10.0,
            ..Default::default()
        };
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "remove");
    }
}
