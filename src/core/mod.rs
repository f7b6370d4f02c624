/// Achievement catalog and unlock evaluation
pub mod achievements;

/// Month-scoped derived totals
pub mod aggregate;

/// Budget envelopes and the overage split
pub mod budget;

/// Mutation Engine: intents, post-pass and outcomes
pub mod engine;

/// Debts and assets
pub mod holdings;

/// Sanitizing and admitting assistant line items
pub mod intake;

/// XP, levels and point pools
pub mod level;

/// Month close and full reset
pub mod monthly;

/// Calendar predicates over an explicit reference instant
pub mod period;

/// Daily and weekly quests
pub mod quests;

/// Plain-text reports
pub mod report;

/// Daily bonus, redeem codes and the shop
pub mod rewards;

/// Tunable gamification rules
pub mod rules;

/// Savings goals
pub mod savings;

/// The state tree and its per-entity invariants
pub mod state;

/// Streak counters
pub mod streaks;

/// Income, general and daily expenses, edit and delete
pub mod transaction;

/// Shared input checks
pub mod validation;

#[cfg(test)]
mod props;
