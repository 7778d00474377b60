// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted copy of the last successfully introspected schema.
//!
//! Cache I/O never fails a query: read and write problems are logged and
//! treated as "no cache".

use std::path::{Path, PathBuf};

use querygate_core::Schema;
use tracing::{debug, warn};

/// File name of the schema cache.
pub const CACHE_FILE_NAME: &str = "schema.catalog.json";

#[derive(Debug, Clone)]
pub struct SchemaCache {
    path: PathBuf,
}

impl SchemaCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/querygate/schema.catalog.json`, or the working directory
    /// when the platform has no data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("querygate"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CACHE_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached schema, or `None` when absent or unreadable.
    pub async fn load(&self) -> Option<Schema> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read schema cache");
                return None;
            }
        };

        match serde_json::from_str::<Schema>(&content) {
            Ok(schema) => {
                debug!(path = %self.path.display(), tables = schema.tables.len(), "schema cache loaded");
                Some(schema)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "schema cache is corrupt");
                None
            }
        }
    }

    /// Overwrite the cache with `schema`.
    pub async fn store(&self, schema: &Schema) {
        let json = match serde_json::to_string_pretty(schema) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize schema cache");
                return;
            }
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            warn!(path = %parent.display(), error = %e, "failed to create schema cache directory");
            return;
        }

        match tokio::fs::write(&self.path, json).await {
            Ok(()) => debug!(path = %self.path.display(), "schema cache saved"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to save schema cache"),
        }
    }
}
