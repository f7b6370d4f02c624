//! Mustika sources and sinks: daily bonus, redeem codes and the shop.

use crate::core::aggregate::summarize;
use crate::core::level::point_totals;
use crate::core::rules::GameRules;
use crate::core::state::AppState;
use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::info;

/// Something that can be bought with Mustika. Each item is owned at most once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopItem {
    /// Stable id stored in the inventory
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Price in Mustika
    pub price: f64,
}

/// The static shop catalog.
pub const SHOP: &[ShopItem] = &[
    ShopItem {
        id: "theme_ocean",
        name: "Ocean theme",
        price: 150.0,
    },
    ShopItem {
        id: "theme_forest",
        name: "Forest theme",
        price: 150.0,
    },
    ShopItem {
        id: "theme_midnight",
        name: "Midnight theme",
        price: 300.0,
    },
    ShopItem {
        id: "avatar_frame_gold",
        name: "Gold avatar frame",
        price: 500.0,
    },
    ShopItem {
        id: "title_budget_sage",
        name: "Title: Budget Sage",
        price: 1_000.0,
    },
];

/// Looks up a shop item.
#[must_use]
pub fn shop_item(id: &str) -> Option<&'static ShopItem> {
    SHOP.iter().find(|item| item.id == id)
}

/// Grants the daily bonus once per calendar day.
pub fn claim_daily_bonus(
    state: &mut AppState,
    as_of: DateTime<FixedOffset>,
    rules: &GameRules,
) -> Result<()> {
    let today = as_of.date_naive();
    let profile = &mut state.profile;
    if profile.last_bonus_claim == Some(today) {
        return Err(Error::AlreadyClaimed {
            what: format!("daily bonus for {today}"),
        });
    }
    profile.bonus_points += rules.daily_bonus;
    profile.last_bonus_claim = Some(today);
    Ok(())
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Redeems a configured code. Codes match case-insensitively and each can be
/// used once. Returns the Mustika granted.
pub fn redeem_code(state: &mut AppState, code: &str, rules: &GameRules) -> Result<f64> {
    let code = normalize_code(code);
    let amount = rules
        .redeem_codes
        .iter()
        .find(|(known, _)| normalize_code(known) == code)
        .map(|(_, amount)| *amount)
        .ok_or_else(|| Error::UnknownCode { code: code.clone() })?;

    let profile = &mut state.profile;
    if profile.redeemed_codes.contains(&code) {
        return Err(Error::AlreadyClaimed {
            what: format!("code {code}"),
        });
    }
    profile.redeemed_mustika += amount;
    profile.redeemed_codes.push(code);
    Ok(amount)
}

/// Buys a shop item with spendable Mustika.
pub fn purchase_item(
    state: &mut AppState,
    item_id: &str,
    as_of: DateTime<FixedOffset>,
    rules: &GameRules,
) -> Result<()> {
    let item = shop_item(item_id).ok_or_else(|| Error::ShopItemNotFound {
        id: item_id.to_string(),
    })?;
    if state.profile.inventory.iter().any(|owned| owned == item.id) {
        return Err(Error::AlreadyClaimed {
            what: item.name.to_string(),
        });
    }
    let summary = summarize(state, as_of);
    let spendable = point_totals(state, &summary, as_of, rules).spendable_mustika;
    if spendable < item.price {
        return Err(Error::InsufficientFunds {
            available: spendable,
            required: item.price,
        });
    }

    state.profile.spent_points += item.price;
    state.profile.inventory.push(item.id.to_string());
    info!("Purchased {} for {} Mustika", item.id, item.price);
    Ok(())
}
