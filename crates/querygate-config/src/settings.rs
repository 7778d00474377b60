// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime settings store.
//!
//! Settings are addressed by dotted keys in the config namespace
//! (`bot.max_rows`, `openai.api_key`, `database.connections.sales`). The live
//! configuration is an immutable snapshot behind an [`ArcSwap`]: every change
//! builds and validates a complete new snapshot, then swaps it in, so readers
//! never observe a half-applied update.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use querygate_core::{ProviderKind, QueryGateError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::crypto;
use crate::diagnostic::suggest_key;
use crate::model::QueryGateConfig;
use crate::validation::validate_config;

/// Sections holding an `api_key` that is encrypted on disk.
const SECRET_SECTIONS: &[&str] = &["openai", "gemini"];

/// Typed, atomically swapped access to the configuration.
pub struct SettingsStore {
    current: ArcSwap<QueryGateConfig>,
    /// Serializes writers; readers never take it.
    write_lock: Mutex<()>,
    path: PathBuf,
    key_path: PathBuf,
}

impl SettingsStore {
    /// Wrap an already loaded configuration.
    ///
    /// Encrypted `api_key` values are opened with the key at `key_path`.
    pub fn new(
        config: QueryGateConfig,
        path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Result<Self, QueryGateError> {
        let key_path = key_path.into();
        let config = if has_encrypted_secrets(&config) {
            let key = crypto::load_or_create_key(&key_path)?;
            reveal_secrets(config, &key)
        } else {
            config
        };

        Ok(Self {
            current: ArcSwap::from_pointee(config),
            write_lock: Mutex::new(()),
            path: path.into(),
            key_path,
        })
    }

    /// Load `path` (plus `QUERYGATE_*` overrides), validate, and open secrets.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, QueryGateError> {
        Self::open_with_key(path, crypto::default_key_path())
    }

    /// Like [`open`](Self::open) with an explicit key file location.
    pub fn open_with_key(
        path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Result<Self, QueryGateError> {
        let path = path.into();
        let config = crate::loader::load_config_from_path(&path).map_err(|e| {
            QueryGateError::Config(format!("failed to load {}: {e}", path.display()))
        })?;
        validate_config(&config).map_err(join_errors)?;
        Self::new(config, path, key_path)
    }

    /// The file this store saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current immutable configuration snapshot.
    pub fn snapshot(&self) -> Arc<QueryGateConfig> {
        self.current.load_full()
    }

    /// The row cap in force (1000 when unset or non-positive).
    pub fn max_rows(&self) -> u64 {
        self.current.load().bot.effective_max_rows()
    }

    /// The configured generator backend.
    pub fn provider(&self) -> ProviderKind {
        self.current.load().bot.provider
    }

    /// Read a setting by dotted key.
    pub fn get_setting<T: DeserializeOwned>(&self, key: &str) -> Result<T, QueryGateError> {
        let tree = to_tree(&self.current.load())?;
        let value = lookup(&tree, key)?;
        serde_json::from_value(value.clone())
            .map_err(|e| QueryGateError::Config(format!("setting `{key}` has an unexpected type: {e}")))
    }

    /// Change a setting by dotted key.
    ///
    /// The change is applied to a copy, deserialized and validated as a
    /// whole, then published. On error the previous snapshot stays in place.
    pub fn set_setting<T: Serialize>(&self, key: &str, value: T) -> Result<(), QueryGateError> {
        let value = serde_json::to_value(value)
            .map_err(|e| QueryGateError::Config(format!("cannot store `{key}`: {e}")))?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| QueryGateError::Internal("settings write lock poisoned".to_string()))?;

        let mut tree = to_tree(&self.current.load())?;
        assign(&mut tree, key, value)?;
        let updated: QueryGateConfig = serde_json::from_value(tree)
            .map_err(|e| QueryGateError::Config(format!("invalid value for `{key}`: {e}")))?;
        validate_config(&updated).map_err(join_errors)?;

        self.current.store(Arc::new(updated));
        tracing::debug!(key, "setting updated");
        Ok(())
    }

    /// Persist the current snapshot as TOML, encrypting credentials.
    pub async fn save(&self) -> Result<(), QueryGateError> {
        let mut config = (*self.snapshot()).clone();
        if config.openai.api_key.is_some() || config.gemini.api_key.is_some() {
            let key = crypto::load_or_create_key(&self.key_path)?;
            for secret in [&mut config.openai.api_key, &mut config.gemini.api_key] {
                if let Some(plain) = secret.as_mut()
                    && !plain.starts_with(crypto::ENCRYPTED_PREFIX)
                {
                    *plain = crypto::seal_secret(&key, plain)?;
                }
            }
        }

        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| QueryGateError::Config(format!("failed to serialize settings: {e}")))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(QueryGateError::storage)?;
        }
        tokio::fs::write(&self.path, rendered)
            .await
            .map_err(QueryGateError::storage)?;

        tracing::info!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

fn has_encrypted_secrets(config: &QueryGateConfig) -> bool {
    [&config.openai.api_key, &config.gemini.api_key]
        .into_iter()
        .flatten()
        .any(|v| v.starts_with(crypto::ENCRYPTED_PREFIX))
}

fn reveal_secrets(mut config: QueryGateConfig, key: &[u8; 32]) -> QueryGateConfig {
    for secret in [&mut config.openai.api_key, &mut config.gemini.api_key] {
        if let Some(value) = secret.as_mut() {
            *value = crypto::reveal(key, value);
        }
    }
    config
}

fn join_errors(errors: Vec<crate::ConfigError>) -> QueryGateError {
    QueryGateError::Config(
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    )
}

fn to_tree(config: &QueryGateConfig) -> Result<Value, QueryGateError> {
    serde_json::to_value(config)
        .map_err(|e| QueryGateError::Internal(format!("failed to serialize settings: {e}")))
}

/// Keys one level below `prefix`, for suggestions.
fn siblings(node: &Value) -> Vec<&str> {
    node.as_object()
        .map(|map| map.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

fn unknown_key(key: &str, segment: &str, node: &Value) -> QueryGateError {
    let valid = siblings(node);
    match suggest_key(segment, &valid) {
        Some(s) => QueryGateError::Config(format!("unknown setting `{key}` (did you mean `{s}`?)")),
        None => QueryGateError::Config(format!("unknown setting `{key}`")),
    }
}

fn lookup<'a>(tree: &'a Value, key: &str) -> Result<&'a Value, QueryGateError> {
    let mut node = tree;
    for segment in key.split('.') {
        node = node
            .get(segment)
            .ok_or_else(|| unknown_key(key, segment, node))?;
    }
    Ok(node)
}

fn assign(tree: &mut Value, key: &str, value: Value) -> Result<(), QueryGateError> {
    let (parent_key, leaf) = match key.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(QueryGateError::Config(format!("invalid setting key `{key}`")));
    }

    let mut node = tree;
    if let Some(parent_key) = parent_key {
        for segment in parent_key.split('.') {
            if node.get(segment).is_none() {
                return Err(unknown_key(key, segment, node));
            }
            node = &mut node[segment];
        }
    }

    // Unknown leaves inside fixed sections are caught by deny_unknown_fields
    // when the tree is deserialized; check here for a better message.
    let is_map_section = parent_key.is_some_and(|p| p == "database.connections");
    if !is_map_section && node.get(leaf).is_none() {
        return Err(unknown_key(key, leaf, node));
    }

    match node.as_object_mut() {
        Some(map) => {
            map.insert(leaf.to_string(), value);
            Ok(())
        }
        None => Err(QueryGateError::Config(format!(
            "setting `{key}` is not inside a section"
        ))),
    }
}

/// Whether a dotted key holds a credential.
pub fn is_secret_key(key: &str) -> bool {
    key.rsplit_once('.')
        .is_some_and(|(section, leaf)| leaf == "api_key" && SECRET_SECTIONS.contains(&section))
}
