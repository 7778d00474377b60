// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Switching between named connections in `[database.connections]`.

use std::sync::Arc;

use querygate_config::SettingsStore;
use querygate_core::QueryGateError;
use tracing::{info, warn};

/// Reported by [`ConnectionManager::current`] when the active connection
/// string matches no named connection.
pub const DEFAULT_CONNECTION_LABEL: &str = "Default (Local)";

pub struct ConnectionManager {
    settings: Arc<SettingsStore>,
}

impl ConnectionManager {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }

    /// Make `name` the active connection and persist the change.
    ///
    /// Returns `Ok(false)` when no connection with that name is configured.
    pub async fn switch_to(&self, name: &str) -> Result<bool, QueryGateError> {
        let snapshot = self.settings.snapshot();
        let Some(target) = snapshot
            .database
            .connections
            .get(name)
            .filter(|c| !c.is_empty())
        else {
            warn!(database = name, "connection string not found");
            return Ok(false);
        };

        self.settings
            .set_setting("database.connection_string", target)?;
        self.settings.save().await?;
        info!(database = name, "switched database");
        Ok(true)
    }

    /// Names of the configured connections.
    pub fn available(&self) -> Vec<String> {
        self.settings
            .snapshot()
            .database
            .connections
            .iter()
            .filter(|(_, target)| !target.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Name of the active connection.
    pub fn current(&self) -> String {
        let snapshot = self.settings.snapshot();
        let active = &snapshot.database.connection_string;
        snapshot
            .database
            .connections
            .iter()
            .find(|(_, target)| *target == active)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| DEFAULT_CONNECTION_LABEL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querygate_config::QueryGateConfig;
    use tempfile::tempdir;

    fn manager(dir: &std::path::Path) -> ConnectionManager {
        let mut config = QueryGateConfig::default();
        config.database.connection_string = "local.db".into();
        config
            .database
            .connections
            .insert("sales".into(), "sales.db".into());
        config
            .database
            .connections
            .insert("hr".into(), "hr.db".into());
        let store = SettingsStore::new(
            config,
            dir.join("querygate.toml"),
            dir.join("settings.key"),
        )
        .unwrap();
        ConnectionManager::new(Arc::new(store))
    }

    #[tokio::test]
    async fn switch_updates_and_saves() {
        let dir = tempdir().unwrap();
        let manager = manager(dir.path());
        assert_eq!(manager.current(), DEFAULT_CONNECTION_LABEL);
        assert_eq!(manager.available(), vec!["hr", "sales"]);

        assert!(manager.switch_to("sales").await.unwrap());
        assert_eq!(manager.current(), "sales");

        let saved = std::fs::read_to_string(dir.path().join("querygate.toml")).unwrap();
        assert!(saved.contains("connection_string = \"sales.db\""), "saved: {saved}");
    }

    #[tokio::test]
    async fn unknown_name_is_refused() {
        let dir = tempdir().unwrap();
        let manager = manager(dir.path());
        assert!(!manager.switch_to("finance").await.unwrap());
        assert_eq!(manager.current(), DEFAULT_CONNECTION_LABEL);
        assert!(!dir.path().join("querygate.toml").exists());
    }
}
