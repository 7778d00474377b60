// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `querygate db` and `querygate config` command implementations.

use std::sync::Arc;

use colored::Colorize;
use querygate_config::SettingsStore;
use querygate_config::settings::is_secret_key;
use querygate_core::QueryGateError;
use querygate_storage::ConnectionManager;
use serde_json::Value;

const MASK: &str = "********";

/// Print configured connections, marking the active one.
pub fn list_databases(settings: Arc<SettingsStore>) {
    let manager = ConnectionManager::new(settings);
    let current = manager.current();
    let names = manager.available();
    if names.is_empty() {
        println!("no named connections; active: {current}");
        return;
    }
    for name in names {
        if name == current {
            println!("{} {}", "*".green(), name.bold());
        } else {
            println!("  {name}");
        }
    }
}

/// Make `name` the active connection and save.
pub async fn switch_database(
    settings: Arc<SettingsStore>,
    name: &str,
) -> Result<(), QueryGateError> {
    let manager = ConnectionManager::new(settings);
    if manager.switch_to(name).await? {
        println!("switched to {}", name.bold());
        Ok(())
    } else {
        Err(QueryGateError::Config(format!(
            "no connection named `{name}`; add it under [database.connections]"
        )))
    }
}

/// The value of `key` as printed by `config get`. Credentials are masked.
pub fn get_setting(settings: &SettingsStore, key: &str) -> Result<String, QueryGateError> {
    let value: Value = settings.get_setting(key)?;
    if is_secret_key(key) && !value.is_null() {
        return Ok(MASK.to_string());
    }
    Ok(match value {
        Value::String(s) => s,
        Value::Null => "(unset)".to_string(),
        other => other.to_string(),
    })
}

/// Change `key` and save. Numbers and booleans are stored typed.
pub async fn set_setting(
    settings: &SettingsStore,
    key: &str,
    raw: &str,
) -> Result<(), QueryGateError> {
    settings.set_setting(key, parse_value(raw))?;
    settings.save().await
}

/// `1000` and `true` become JSON scalars; anything else is a string.
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}
