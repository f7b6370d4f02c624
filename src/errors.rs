//! Unified error type for the ledger engine, storage adapter and configuration.
//!
//! Variants follow the failure taxonomy of the engine: validation rejections
//! leave the state untouched, storage and import failures are reported without
//! touching the in-memory state.

use thiserror::Error;

/// Every failure the crate can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// The storage backend failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Amount is negative, zero where not allowed, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Malformed intent (empty description, bad index, ...)
    #[error("Invalid input: {message}")]
    Validation {
        /// Human-readable description
        message: String,
    },

    /// No budget with the given id
    #[error("Budget not found: {id}")]
    BudgetNotFound {
        /// Requested id
        id: i64,
    },

    /// No savings goal with the given id
    #[error("Savings goal not found: {id}")]
    GoalNotFound {
        /// Requested id
        id: i64,
    },

    /// No debt with the given id
    #[error("Debt not found: {id}")]
    DebtNotFound {
        /// Requested id
        id: i64,
    },

    /// No asset with the given id
    #[error("Asset not found: {id}")]
    AssetNotFound {
        /// Requested id
        id: i64,
    },

    /// No transaction at the given location
    #[error("Transaction not found: {location}")]
    TransactionNotFound {
        /// Where the lookup was attempted
        location: String,
    },

    /// The action would spend more than is available
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        /// What the user has
        available: f64,
        /// What the action needs
        required: f64,
    },

    /// A budget expense exceeds the remaining quota and must be split
    #[error("Expense of {amount} exceeds remaining quota {remaining} of budget '{budget}'")]
    OverageRequiresConfirmation {
        /// Budget name
        budget: String,
        /// Requested amount
        amount: f64,
        /// Quota left this month
        remaining: f64,
    },

    /// A destructive or period-closing action was not confirmed
    #[error("Action requires confirmation: {action}")]
    ConfirmationRequired {
        /// The action that was attempted
        action: String,
    },

    /// A one-time reward was already claimed
    #[error("Already claimed: {what}")]
    AlreadyClaimed {
        /// What was claimed
        what: String,
    },

    /// Redeem code is not known
    #[error("Unknown redeem code: {code}")]
    UnknownCode {
        /// The submitted code
        code: String,
    },

    /// Shop item lookup failed
    #[error("Shop item not found: {id}")]
    ShopItemNotFound {
        /// Requested item id
        id: String,
    },

    /// Backup file is malformed or cannot be decrypted
    #[error("Import error: {message}")]
    Import {
        /// Human-readable description
        message: String,
    },

    /// The action needs persistence but the store has none
    #[error("Storage unavailable: cannot {action}")]
    StorageUnavailable {
        /// The action that was attempted
        action: String,
    },

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Base64 payload is malformed
    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable is missing or not unicode
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Whether the error is a rejected intent: the state was left unchanged
    /// and nothing needs to be persisted or rolled back.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::Validation { .. }
                | Self::BudgetNotFound { .. }
                | Self::GoalNotFound { .. }
                | Self::DebtNotFound { .. }
                | Self::AssetNotFound { .. }
                | Self::TransactionNotFound { .. }
                | Self::InsufficientFunds { .. }
                | Self::OverageRequiresConfirmation { .. }
                | Self::ConfirmationRequired { .. }
                | Self::AlreadyClaimed { .. }
                | Self::UnknownCode { .. }
                | Self::ShopItemNotFound { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_classified() {
        assert!(Error::InvalidAmount { amount: -1.0 }.is_rejection());
        assert!(Error::BudgetNotFound { id: 7 }.is_rejection());
        assert!(Error::AssetNotFound { id: 3 }.is_rejection());
        assert!(
            !Error::StorageUnavailable {
                action: "restore backup".to_string()
            }
            .is_rejection()
        );
        assert!(
            Error::ConfirmationRequired {
                action: "close month".to_string()
            }
            .is_rejection()
        );
        assert!(
            !Error::Import {
                message: "bad file".to_string()
            }
            .is_rejection()
        );
        assert!(
            !Error::Config {
                message: "missing".to_string()
            }
            .is_rejection()
        );
    }

    #[test]
    fn test_overage_message_names_budget() {
        let err = Error::OverageRequiresConfirmation {
            budget: "Food".to_string(),
            amount: 250_000.0,
            remaining: 200_000.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("Food"));
        assert!(msg.contains("250000"));
    }
}
