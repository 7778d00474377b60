// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires the settings store, the SQLite backend and the orchestrator.

use std::sync::Arc;

use querygate_agent::{GeneratorFactory, QueryOrchestrator};
use querygate_config::SettingsStore;
use querygate_core::{ConversationContext, ExecutionResult, QueryGateError, Schema, SchemaProvider};
use querygate_storage::SqliteDatabase;
use tracing::info;

pub struct App {
    database: Arc<SqliteDatabase>,
    orchestrator: QueryOrchestrator,
}

impl App {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        let config = settings.snapshot();
        let database = Arc::new(
            SqliteDatabase::from_config(&config.database).with_row_cap(settings.max_rows()),
        );
        let orchestrator = QueryOrchestrator::new(
            Arc::new(GeneratorFactory::new(Arc::clone(&settings))),
            Arc::clone(&database) as _,
            Arc::clone(&database) as _,
            Arc::clone(&settings),
        );

        info!(
            database = database.connection_string(),
            provider = %config.bot.provider,
            max_rows = settings.max_rows(),
            "querygate ready"
        );
        Self {
            database,
            orchestrator,
        }
    }

    pub async fn ask(&self, question: &str, context: &ConversationContext) -> ExecutionResult {
        self.orchestrator.process(question, context).await
    }

    /// The schema snapshot, re-read from the database when `refresh` is set.
    pub async fn schema(&self, refresh: bool) -> Result<Arc<Schema>, QueryGateError> {
        if refresh {
            self.database.refresh().await
        } else {
            self.database.schema().await
        }
    }
}
