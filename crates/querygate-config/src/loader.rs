// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./querygate.toml` > `~/.config/querygate/querygate.toml`
//! > `/etc/querygate/querygate.toml` with environment variable overrides via
//! the `QUERYGATE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::QueryGateConfig;

const SYSTEM_CONFIG: &str = "/etc/querygate/querygate.toml";
const LOCAL_CONFIG: &str = "querygate.toml";

/// Sections recognised in `QUERYGATE_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["database", "bot", "openai", "gemini", "ollama", "logging"];

/// The per-user config file (`$XDG_CONFIG_HOME/querygate/querygate.toml`).
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("querygate").join("querygate.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/querygate/querygate.toml`
/// 3. `~/.config/querygate/querygate.toml`
/// 4. `./querygate.toml`
/// 5. `QUERYGATE_*` environment variables
pub fn load_config() -> Result<QueryGateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<QueryGateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QueryGateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<QueryGateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QueryGateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the full layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(QueryGateConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Read every config file that exists, for diagnostic source spans.
pub(crate) fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![PathBuf::from(SYSTEM_CONFIG)];
    candidates.extend(user_config_path());
    candidates.push(
        std::env::current_dir()
            .map(|d| d.join(LOCAL_CONFIG))
            .unwrap_or_else(|_| PathBuf::from(LOCAL_CONFIG)),
    );

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}

/// Map `QUERYGATE_BOT_MAX_ROWS` to `bot.max_rows`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that themselves contain underscores (`connection_string`,
/// `request_timeout_secs`) stay intact.
pub fn env_key_to_path(key: &str) -> String {
    let lower = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = lower.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    lower
}

fn env_provider() -> Env {
    Env::prefixed("QUERYGATE_").map(|key| env_key_to_path(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(env_key_to_path("bot_max_rows"), "bot.max_rows");
        assert_eq!(
            env_key_to_path("DATABASE_CONNECTION_STRING"),
            "database.connection_string"
        );
        assert_eq!(env_key_to_path("openai_api_key"), "openai.api_key");
        assert_eq!(
            env_key_to_path("bot_request_timeout_secs"),
            "bot.request_timeout_secs"
        );
    }

    #[test]
    fn unknown_env_section_passes_through() {
        assert_eq!(env_key_to_path("weird_key"), "weird_key");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = load_config_from_path(Path::new("/nonexistent/querygate.toml"))
            .expect("missing file should be skipped");
        assert_eq!(config.bot.max_rows, 1000);
    }
}
