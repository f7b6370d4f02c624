//! Export and import files.
//!
//! An export is a JSON envelope `{app, version, secure, payload}` whose
//! payload is the state JSON XOR-ed with the configured secret and base64
//! encoded. The obfuscation only deters casual editing; it is not
//! encryption. Plain state JSON from older versions is still accepted.
//!
//! Imports are validated before anything is deserialized into a state, so a
//! bad file never yields a partial state.

use crate::core::state::AppState;
use crate::errors::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Value of the `app` field in exports.
pub const APP_NAME: &str = "BudgetQuest";

/// Top-level fields a state must have to be imported.
const REQUIRED_FIELDS: [&str; 2] = ["budgets", "archives"];

/// Largest magnitude an imported amount or point pool may have.
pub const MAX_IMPORTED_VALUE: f64 = 1e15;

/// The export file wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEnvelope {
    /// Producing app
    pub app: String,
    /// App version at export time
    pub version: String,
    /// Whether `payload` is obfuscated
    pub secure: bool,
    /// The state, obfuscated when `secure`
    pub payload: String,
}

fn xor_with(bytes: &[u8], secret: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .zip(secret.iter().cycle())
        .map(|(b, k)| b ^ k)
        .collect()
}

fn require_secret(secret: &str) -> Result<&[u8]> {
    if secret.is_empty() {
        return Err(Error::Config {
            message: "Export secret cannot be empty".to_string(),
        });
    }
    Ok(secret.as_bytes())
}

/// XOR-then-base64 obfuscation of `plain`.
pub fn obfuscate(plain: &str, secret: &str) -> Result<String> {
    let key = require_secret(secret)?;
    Ok(STANDARD.encode(xor_with(plain.as_bytes(), key)))
}

/// Reverses [`obfuscate`].
pub fn deobfuscate(payload: &str, secret: &str) -> Result<String> {
    let key = require_secret(secret)?;
    let bytes = STANDARD.decode(payload.trim())?;
    String::from_utf8(xor_with(&bytes, key)).map_err(|_| Error::Import {
        message: "Backup could not be decrypted with this key".to_string(),
    })
}

/// Serializes `state` into an export file.
pub fn encode_backup(state: &AppState, version: &str, secret: &str) -> Result<String> {
    let json = serde_json::to_string(state)?;
    let envelope = ExportEnvelope {
        app: APP_NAME.to_string(),
        version: version.to_string(),
        secure: true,
        payload: obfuscate(&json, secret)?,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

fn import_error(message: &str) -> Error {
    Error::Import {
        message: message.to_string(),
    }
}

/// Checks the top-level shape of a state value.
fn validate_shape(value: &Value) -> Result<()> {
    let object = value
        .as_object()
        .ok_or_else(|| import_error("Backup does not contain an app state"))?;
    for field in REQUIRED_FIELDS {
        if !object.get(field).is_some_and(Value::is_array) {
            return Err(Error::Import {
                message: format!("Backup is missing '{field}'"),
            });
        }
    }
    Ok(())
}

/// Checks that every amount and point pool of an imported state is finite
/// and within [`MAX_IMPORTED_VALUE`].
fn validate_values(state: &AppState) -> Result<()> {
    let profile = &state.profile;
    let pools = [
        ("bonusPoints", profile.bonus_points),
        ("redeemedMustika", profile.redeemed_mustika),
        ("accumulatedXP", profile.accumulated_xp),
        ("spentPoints", profile.spent_points),
        ("levelRewardPoints", profile.level_reward_points),
    ];
    let amounts = state
        .fund_history
        .iter()
        .map(|tx| tx.amount)
        .chain(state.daily_expenses.iter().map(|tx| tx.amount))
        .chain(state.budgets.iter().flat_map(|b| {
            std::iter::once(b.total_budget).chain(b.history.iter().map(|tx| tx.amount))
        }))
        .chain(state.savings_goals.iter().flat_map(|g| {
            g.target_amount
                .into_iter()
                .chain(std::iter::once(g.saved_amount))
                .chain(g.history.iter().map(|tx| tx.amount))
        }))
        .chain(state.debts.iter().flat_map(|d| {
            [d.amount, d.paid]
                .into_iter()
                .chain(d.history.iter().map(|r| r.amount))
        }))
        .chain(state.assets.iter().map(|a| a.value))
        .chain(
            state
                .archives
                .iter()
                .flat_map(|a| a.transactions.iter().map(|tx| tx.amount)),
        );

    let in_range = |value: f64| value.is_finite() && value.abs() <= MAX_IMPORTED_VALUE;
    if let Some((name, value)) = pools
        .into_iter()
        .find(|(_, value)| !in_range(*value) || *value < 0.0)
    {
        return Err(Error::Import {
            message: format!("Backup has an invalid {name}: {value}"),
        });
    }
    if let Some(value) = amounts.into_iter().find(|value| !in_range(*value)) {
        return Err(Error::Import {
            message: format!("Backup has an invalid amount: {value}"),
        });
    }
    Ok(())
}

/// Parses an export file, or a legacy plain-JSON state, into a state.
///
/// Three layouts are accepted: the obfuscated envelope written by
/// [`encode_backup`], an envelope whose payload is plain state JSON, and a
/// bare state object from older versions. The state is checked for the
/// required top-level arrays before it is deserialized, and its amounts and
/// point pools are range-checked after.
///
/// # Arguments
///
/// * `raw` - The file contents
/// * `secret` - Key the payload was obfuscated with
///
/// # Returns
///
/// The imported state. Nothing is merged with the current state.
///
/// # Errors
///
/// Returns `Error::Import` if the file is not JSON, cannot be deobfuscated
/// with `secret`, lacks a required field, does not match the state layout, or
/// holds a non-finite or out-of-range value.
pub fn decode_backup(raw: &str, secret: &str) -> Result<AppState> {
    let value: Value =
        serde_json::from_str(raw).map_err(|_| import_error("Backup file is not valid JSON"))?;

    let secure_payload = value
        .get("secure")
        .and_then(Value::as_bool)
        .filter(|secure| *secure)
        .and_then(|_| value.get("payload"))
        .and_then(Value::as_str);

    let state_value = if let Some(payload) = secure_payload {
        let json = deobfuscate(payload, secret).inspect_err(|e| warn!("Decrypt failed: {}", e))?;
        serde_json::from_str(&json)
            .map_err(|_| import_error("Backup could not be decrypted with this key"))?
    } else if let Some(Value::String(payload)) = value.get("payload") {
        debug!("Importing unobfuscated envelope");
        serde_json::from_str(payload).map_err(|_| import_error("Backup payload is not valid JSON"))?
    } else {
        debug!("Importing legacy plain backup");
        value
    };

    validate_shape(&state_value)?;
    let state: AppState = serde_json::from_value(state_value).map_err(|e| Error::Import {
        message: format!("Backup does not match the app state: {e}"),
    })?;
    validate_values(&state)?;
    Ok(state)
}
