//! Input checks shared by every transform. They run before anything is
//! written, so a rejected intent never touches the state.

use crate::core::state::Amount;
use crate::errors::{Error, Result};

/// A strictly positive, finite amount.
pub fn positive_amount(amount: f64) -> Result<Amount> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// A non-negative, finite amount (quotas and asset values may be zero).
pub fn non_negative_amount(amount: f64) -> Result<Amount> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// Trimmed, non-empty text.
pub fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_positive_amount() {
        assert_eq!(positive_amount(5.0).unwrap(), 5.0);
        assert!(matches!(
            positive_amount(0.0),
            Err(Error::InvalidAmount { amount: 0.0 })
        ));
        assert!(positive_amount(-1.0).is_err());
        assert!(positive_amount(f64::NAN).is_err());
        assert!(positive_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_non_negative_amount_allows_zero() {
        assert_eq!(non_negative_amount(0.0).unwrap(), 0.0);
        assert!(non_negative_amount(-0.01).is_err());
        assert!(non_negative_amount(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text("Name", "  Food ").unwrap(), "Food");
        let err = required_text("Name", "   ").unwrap_err();
        assert!(err.to_string().contains("Name cannot be empty"));
    }
}
