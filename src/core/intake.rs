//! Line items produced by the external receipt/chat assistant.
//!
//! The assistant output is untrusted: it is parsed leniently, sanitized, and
//! only the surviving items are admitted as transactions.

use crate::core::budget::{ExpensePlan, plan_budget_expense};
use crate::core::state::{AppState, Transaction};
use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// One item as returned by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LineItem {
    /// Description
    pub desc: String,
    /// Amount; must be positive to be admitted
    pub amount: f64,
    /// Optional category hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn amount_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn item_of(value: &Value) -> Option<LineItem> {
    let desc = value.get("desc")?.as_str()?.to_string();
    let amount = value.get("amount").and_then(amount_of)?;
    let category = value
        .get("category")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(LineItem {
        desc,
        amount,
        category,
    })
}

/// Parses assistant output: either a bare array of items or an object with
/// an `items` array. Entries that are not item-shaped are skipped.
pub fn parse_line_items(raw: &str) -> Result<Vec<LineItem>> {
    let value: Value = serde_json::from_str(raw)?;
    let entries = match &value {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(Error::Validation {
                    message: "Assistant response has no items".to_string(),
                });
            }
        },
        _ => {
            return Err(Error::Validation {
                message: "Assistant response is not a list of items".to_string(),
            });
        }
    };
    Ok(entries.iter().filter_map(item_of).collect())
}

/// Keeps the items with a non-empty description and a positive finite amount.
#[must_use]
pub fn sanitize_line_items(items: Vec<LineItem>) -> Vec<LineItem> {
    let total = items.len();
    let kept: Vec<LineItem> = items
        .into_iter()
        .filter_map(|mut item| {
            item.desc = item.desc.trim().to_string();
            item.category = item
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            (!item.desc.is_empty() && item.amount.is_finite() && item.amount > 0.0).then_some(item)
        })
        .collect();
    if kept.len() < total {
        warn!("Dropped {} invalid line items", total - kept.len());
    }
    kept
}

/// Admits sanitized items as daily expenses, or against `budget_id` when
/// given. Fails when nothing survives sanitizing. Returns the admitted count.
///
/// Items admitted against a budget obey the same rules as a manual budget
/// expense: the budget must be active and their total must fit the remaining
/// quota. Scans are never split; an over-quota scan is rejected with
/// `Error::OverageRequiresConfirmation` and can be admitted as daily
/// expenses instead.
pub fn admit_line_items(
    state: &mut AppState,
    items: Vec<LineItem>,
    budget_id: Option<i64>,
    as_of: DateTime<FixedOffset>,
) -> Result<usize> {
    let items = sanitize_line_items(items);
    if items.is_empty() {
        return Err(Error::Validation {
            message: "No valid line items to add".to_string(),
        });
    }
    if let Some(id) = budget_id {
        let total: f64 = items.iter().map(|item| item.amount).sum();
        if let ExpensePlan::Overage(split) = plan_budget_expense(state, id, total, as_of)? {
            return Err(Error::OverageRequiresConfirmation {
                budget: split.budget_name,
                amount: total,
                remaining: split.to_budget,
            });
        }
    }

    let count = items.len();
    let transactions = items.into_iter().map(|item| Transaction {
        desc: item.desc,
        amount: item.amount,
        timestamp: as_of.to_utc(),
        source_category: item.category,
    });
    match budget_id.and_then(|id| state.budget_mut(id)) {
        Some(budget) => budget.history.extend(transactions),
        None => state.daily_expenses.extend(transactions),
    }
    state.achievement_data.scanned_receipts += u32::try_from(count).unwrap_or(u32::MAX);
    debug!("Admitted {} scanned items", count);
    Ok(count)
}
