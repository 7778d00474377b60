// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Querygate SQL gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use querygate_core::ProviderKind;
use querygate_core::types::effective_max_rows;
use serde::{Deserialize, Serialize};

/// Top-level Querygate configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueryGateConfig {
    /// Target database and named connections.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Generator selection and query limits.
    #[serde(default)]
    pub bot: BotConfig,

    /// OpenAI chat completions settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Google Gemini settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Local Ollama settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Target database configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// The active connection string (a SQLite path, or `:memory:`).
    #[serde(default = "default_connection_string")]
    pub connection_string: String,

    /// Named connection strings that can be switched to at runtime.
    #[serde(default)]
    pub connections: BTreeMap<String, String>,

    /// Where the last introspected schema is persisted. Defaults to the
    /// platform data directory.
    #[serde(default)]
    pub schema_cache_path: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: default_connection_string(),
            connections: BTreeMap::new(),
            schema_cache_path: None,
        }
    }
}

fn default_connection_string() -> String {
    "querygate.db".to_string()
}

/// Generator selection and result limits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Which SQL generator backend to use.
    #[serde(default)]
    pub provider: ProviderKind,

    /// Maximum rows a query may return. Non-positive means the default (1000).
    #[serde(default = "default_max_rows")]
    pub max_rows: i64,

    /// Per-request timeout for generator calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl BotConfig {
    /// The row cap actually enforced.
    pub fn effective_max_rows(&self) -> u64 {
        effective_max_rows(self.max_rows)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            max_rows: default_max_rows(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_max_rows() -> i64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// OpenAI API configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Google Gemini API configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-pro".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

/// Local Ollama server configuration. No credentials.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama2".to_string()
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = QueryGateConfig::default();
        assert_eq!(config.bot.provider, ProviderKind::OpenAi);
        assert_eq!(config.bot.max_rows, 1000);
        assert_eq!(config.bot.request_timeout_secs, 60);
        assert_eq!(config.openai.model, "gpt-4");
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.gemini.model, "gemini-pro");
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.ollama.model, "llama2");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn non_positive_max_rows_uses_default_cap() {
        let mut bot = BotConfig::default();
        bot.max_rows = 0;
        assert_eq!(bot.effective_max_rows(), 1000);
        bot.max_rows = -1;
        assert_eq!(bot.effective_max_rows(), 1000);
        bot.max_rows = 50;
        assert_eq!(bot.effective_max_rows(), 50);
    }

    #[test]
    fn provider_name_is_case_insensitive_in_toml() {
        let config: QueryGateConfig = toml::from_str("[bot]\nprovider = \"Ollama\"\n").unwrap();
        assert_eq!(config.bot.provider, ProviderKind::Ollama);
    }

    #[test]
    fn unknown_provider_rejected_at_load() {
        let result = toml::from_str::<QueryGateConfig>("[bot]\nprovider = \"bard\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn named_connections_deserialize() {
        let toml_str = r#"
[database]
connection_string = "local.db"

[database.connections]
sales = "/srv/sales.db"
hr = "/srv/hr.db"
"#;
        let config: QueryGateConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.connections.len(), 2);
        assert_eq!(config.database.connections["sales"], "/srv/sales.db");
    }
}
