// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Querygate SQL gateway.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `QUERYGATE_*` environment overrides, miette
//! diagnostics with typo suggestions, and the [`SettingsStore`] used at runtime
//! to read, change and persist individual settings.
//!
//! # Usage
//!
//! ```no_run
//! use querygate_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("provider: {}", config.bot.provider);
//! ```

pub mod crypto;
pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod settings;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::QueryGateConfig;
pub use settings::SettingsStore;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Figment errors are converted to miette diagnostics with source spans where
/// the offending file can be located.
pub fn load_and_validate() -> Result<QueryGateConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &loader::collect_toml_sources(),
        )),
    }
}

/// Load configuration from `path` (plus `QUERYGATE_*` overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<QueryGateConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources: Vec<(String, String)> = std::fs::read_to_string(path)
                .map(|content| (path.display().to_string(), content))
                .into_iter()
                .collect();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<QueryGateConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}
