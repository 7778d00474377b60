// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express: non-empty
//! connection strings, well-formed provider URLs, a usable request timeout.

use crate::diagnostic::ConfigError;
use crate::model::QueryGateConfig;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &QueryGateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.database.connection_string.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "database.connection_string must not be empty".to_string(),
        });
    }

    for (name, conn) in &config.database.connections {
        if name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "database.connections contains an empty name".to_string(),
            });
        }
        if conn.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("database.connections.{name} must not be empty"),
            });
        }
    }

    if config.bot.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "bot.request_timeout_secs must be at least 1".to_string(),
        });
    }

    for (key, value) in [
        ("openai.base_url", &config.openai.base_url),
        ("gemini.base_url", &config.gemini.base_url),
        ("ollama.base_url", &config.ollama.base_url),
    ] {
        match url::Url::parse(value) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => errors.push(ConfigError::Validation {
                message: format!("{key} must use http or https, got `{}`", parsed.scheme()),
            }),
            Err(e) => errors.push(ConfigError::Validation {
                message: format!("{key} `{value}` is not a valid URL: {e}"),
            }),
        }
    }

    for (key, value) in [
        ("openai.model", &config.openai.model),
        ("gemini.model", &config.gemini.model),
        ("ollama.model", &config.ollama.model),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&QueryGateConfig::default()).is_ok());
    }

    #[test]
    fn negative_max_rows_is_not_an_error() {
        let mut config = QueryGateConfig::default();
        config.bot.max_rows = -10;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_connection_string_fails() {
        let mut config = QueryGateConfig::default();
        config.database.connection_string = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("connection_string")));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = QueryGateConfig::default();
        config.bot.request_timeout_secs = 0;
        config.ollama.base_url = "not a url".to_string();
        config.openai.base_url = "ftp://example.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        let all = messages(&errors).join("\n");
        assert!(all.contains("request_timeout_secs"));
        assert!(all.contains("ollama.base_url"));
        assert!(all.contains("http or https"));
    }

    #[test]
    fn empty_named_connection_fails() {
        let mut config = QueryGateConfig::default();
        config
            .database
            .connections
            .insert("sales".to_string(), String::new());
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("database.connections.sales"));
    }
}
