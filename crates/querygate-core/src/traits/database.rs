// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database-side collaborators: schema catalog and query execution.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::QueryGateError;
use crate::types::{Parameters, Schema, TabularResult};

/// Supplies the schema snapshot and the structural pre-check.
#[async_trait]
pub trait SchemaProvider: Send + Sync + 'static {
    /// Returns the current schema snapshot.
    ///
    /// Implementations fall back to their last known good snapshot (or a
    /// persisted cache) when the live catalog is unreachable, and return an
    /// empty schema only when nothing is cached.
    async fn schema(&self) -> Result<Arc<Schema>, QueryGateError>;

    /// Re-reads the live catalog and atomically replaces the snapshot.
    async fn refresh(&self) -> Result<Arc<Schema>, QueryGateError>;

    /// Probes whether `sql` is structurally valid without executing it.
    async fn check_structure(&self, sql: &str) -> bool;
}

/// Runs validated SQL with bound parameters.
#[async_trait]
pub trait QueryExecutor: Send + Sync + 'static {
    /// Executes `sql` and returns rows plus column metadata.
    async fn execute(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<TabularResult, QueryGateError>;
}
