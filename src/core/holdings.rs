//! Debts and assets: balances that live outside the monthly ledger.

use crate::core::state::{
    AppState, Asset, Debt, DebtKind, DebtRecord, FundKind, FundTransaction,
};
use crate::core::validation::{non_negative_amount, positive_amount, required_text};
use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Input for a new debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDebt {
    /// Direction
    pub kind: DebtKind,
    /// Counterparty
    pub person: String,
    /// Principal
    pub amount: f64,
    /// Mirror the money movement into the fund history
    #[serde(default)]
    pub sync_wallet: bool,
}

/// Fund direction for money moving when a debt is opened. Repayments move
/// the other way.
const fn opening_flow(kind: DebtKind) -> FundKind {
    match kind {
        DebtKind::Borrowed => FundKind::Add,
        DebtKind::Lent => FundKind::Remove,
    }
}

const fn repayment_flow(kind: DebtKind) -> FundKind {
    match kind {
        DebtKind::Borrowed => FundKind::Remove,
        DebtKind::Lent => FundKind::Add,
    }
}

/// Records a new debt and returns its id.
pub fn add_debt(state: &mut AppState, debt: NewDebt, as_of: DateTime<FixedOffset>) -> Result<i64> {
    let person = required_text("Person", &debt.person)?;
    let amount = positive_amount(debt.amount)?;
    let id = state.next_debt_id();
    if debt.sync_wallet {
        let desc = match debt.kind {
            DebtKind::Borrowed => format!("Loan from {person}"),
            DebtKind::Lent => format!("Loan to {person}"),
        };
        state.fund_history.push(FundTransaction {
            kind: opening_flow(debt.kind),
            desc,
            amount,
            timestamp: as_of.to_utc(),
        });
    }
    state.debts.push(Debt {
        id,
        kind: debt.kind,
        person,
        amount,
        paid: 0.0,
        history: Vec::new(),
        is_paid_off: false,
    });
    Ok(id)
}

/// Records a repayment. Paying more than is outstanding is rejected.
pub fn record_payment(
    state: &mut AppState,
    debt_id: i64,
    amount: f64,
    note: &str,
    sync_wallet: bool,
    as_of: DateTime<FixedOffset>,
) -> Result<()> {
    let amount = positive_amount(amount)?;
    let debt = state
        .debt_mut(debt_id)
        .ok_or(Error::DebtNotFound { id: debt_id })?;
    let outstanding = debt.outstanding();
    if amount > outstanding {
        return Err(Error::Validation {
            message: format!("Payment {amount} exceeds outstanding {outstanding}"),
        });
    }
    debt.history.push(DebtRecord {
        amount,
        timestamp: as_of.to_utc(),
        note: note.trim().to_string(),
    });
    debt.recompute();

    let (kind, person) = (debt.kind, debt.person.clone());
    if sync_wallet {
        state.fund_history.push(FundTransaction {
            kind: repayment_flow(kind),
            desc: format!("Debt payment: {person}"),
            amount,
            timestamp: as_of.to_utc(),
        });
    }
    Ok(())
}

/// Removes a debt and its history.
pub fn delete_debt(state: &mut AppState, debt_id: i64) -> Result<()> {
    let before = state.debts.len();
    state.debts.retain(|d| d.id != debt_id);
    if state.debts.len() == before {
        return Err(Error::DebtNotFound { id: debt_id });
    }
    Ok(())
}

/// Creates an asset when `id` is `None`, otherwise updates it. Returns the id.
pub fn upsert_asset(state: &mut AppState, id: Option<i64>, name: &str, value: f64) -> Result<i64> {
    let name = required_text("Asset name", name)?;
    let value = non_negative_amount(value)?;
    match id {
        Some(id) => {
            let asset = state
                .assets
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(Error::AssetNotFound { id })?;
            asset.name = name;
            asset.value = value;
            Ok(id)
        }
        None => {
            let id = state.next_asset_id();
            state.assets.push(Asset { id, name, value });
            Ok(id)
        }
    }
}

/// Removes an asset.
pub fn remove_asset(state: &mut AppState, id: i64) -> Result<()> {
    let before = state.assets.len();
    state.assets.retain(|a| a.id != id);
    if state.assets.len() == before {
        return Err(Error::AssetNotFound { id });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::aggregate::{net_worth, summarize};
    use crate::test_utils::at;

    fn borrowed(amount: f64, sync_wallet: bool) -> NewDebt {
        NewDebt {
            kind: DebtKind::Borrowed,
            person: "Rina".to_string(),
            amount,
            sync_wallet,
        }
    }

    #[test]
    fn test_borrowed_debt_sync_wallet() {
        let now = at(2025, 5, 5, 12);
        let mut state = AppState::default();
        let id = add_debt(&mut state, borrowed(500.0, true), now).unwrap();
        assert_eq!(state.fund_history[0].kind, FundKind::Add);

        record_payment(&mut state, id, 200.0, " first ", true, now).unwrap();
        assert_eq!(state.fund_history[1].kind, FundKind::Remove);
        assert_eq!(state.debts[0].paid, 200.0);
        assert_eq!(state.debts[0].history[0].note, "first");
        assert!(!state.debts[0].is_paid_off);

        record_payment(&mut state, id, 300.0, "", false, now).unwrap();
        assert!(state.debts[0].is_paid_off);
        assert_eq!(state.fund_history.len(), 2);
    }

    #[test]
    fn test_overpayment_rejected() {
        let now = at(2025, 5, 5, 12);
        let mut state = AppState::default();
        let id = add_debt(&mut state, borrowed(100.0, false), now).unwrap();
        assert!(record_payment(&mut state, id, 150.0, "", false, now).is_err());
        assert!(state.debts[0].history.is_empty());
        assert!(matches!(
            record_payment(&mut state, 42, 1.0, "", false, now),
            Err(Error::DebtNotFound { id: 42 })
        ));
    }

    #[test]
    fn test_lent_money_counts_toward_net_worth() {
        let now = at(2025, 5, 5, 12);
        let mut state = AppState::default();
        add_debt(
            &mut state,
            NewDebt {
                kind: DebtKind::Lent,
                person: "Budi".to_string(),
                amount: 250.0,
                sync_wallet: false,
            },
            now,
        )
        .unwrap();
        upsert_asset(&mut state, None, "Bike", 1_000.0).unwrap();
        let summary = summarize(&state, now);
        assert_eq!(net_worth(&state, &summary), 1_250.0);
    }

    #[test]
    fn test_asset_upsert_and_remove() {
        let mut state = AppState::default();
        let id = upsert_asset(&mut state, None, "Gold", 10.0).unwrap();
        upsert_asset(&mut state, Some(id), "Gold bar", 0.0).unwrap();
        assert_eq!(state.assets[0].name, "Gold bar");
        assert_eq!(state.assets[0].value, 0.0);
        assert!(matches!(
            upsert_asset(&mut state, Some(99), "X", 1.0),
            Err(Error::AssetNotFound { id: 99 })
        ));
        remove_asset(&mut state, id).unwrap();
        assert!(matches!(
            remove_asset(&mut state, id),
            Err(Error::AssetNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_debt() {
        let now = at(2025, 5, 5, 12);
        let mut state = AppState::default();
        let id = add_debt(&mut state, borrowed(1.0, false), now).unwrap();
        delete_debt(&mut state, id).unwrap();
        assert!(delete_debt(&mut state, id).is_err());
    }
}
