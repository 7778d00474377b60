// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end orchestrator testing.
//!
//! `TestHarness` assembles a complete orchestrator with a mock generator, a
//! mock database and a settings store in a temp directory. Provides `ask()`
//! to drive the full state machine in tests.

use std::sync::Arc;

use querygate_agent::{FixedGenerator, QueryOrchestrator};
use querygate_config::{QueryGateConfig, SettingsStore};
use querygate_core::{ConversationContext, ExecutionResult, QueryGateError, SqlGenerator};

use crate::mock_database::MockDatabase;
use crate::mock_generator::MockGenerator;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: QueryGateConfig,
    database: Option<MockDatabase>,
    generator: Option<Arc<dyn SqlGenerator>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: QueryGateConfig::default(),
            database: None,
            generator: None,
        }
    }

    /// Set the row cap (`bot.max_rows`).
    pub fn with_max_rows(mut self, max_rows: i64) -> Self {
        self.config.bot.max_rows = max_rows;
        self
    }

    /// Start from a custom configuration.
    pub fn with_config(mut self, config: QueryGateConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `database` instead of [`MockDatabase::customers`].
    pub fn with_database(mut self, database: MockDatabase) -> Self {
        self.database = Some(database);
        self
    }

    /// Put `generator` in front of the orchestrator instead of the mock,
    /// for example a retry-wrapped mock.
    pub fn with_generator(mut self, generator: Arc<dyn SqlGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub fn build(self) -> Result<TestHarness, QueryGateError> {
        let temp_dir = tempfile::TempDir::new().map_err(QueryGateError::storage)?;
        let settings = Arc::new(SettingsStore::new(
            self.config,
            temp_dir.path().join("querygate.toml"),
            temp_dir.path().join("settings.key"),
        )?);

        let generator = Arc::new(MockGenerator::new());
        let front: Arc<dyn SqlGenerator> = match self.generator {
            Some(custom) => custom,
            None => Arc::clone(&generator) as Arc<dyn SqlGenerator>,
        };
        let database = Arc::new(self.database.unwrap_or_else(MockDatabase::customers));

        let orchestrator = QueryOrchestrator::new(
            Arc::new(FixedGenerator::new(front)),
            Arc::clone(&database) as _,
            Arc::clone(&database) as _,
            Arc::clone(&settings),
        );

        Ok(TestHarness {
            generator,
            database,
            settings,
            orchestrator,
            context: ConversationContext::new(),
            _temp_dir: temp_dir,
        })
    }
}

/// A fully wired orchestrator over mocks.
pub struct TestHarness {
    /// The script behind the default generator.
    pub generator: Arc<MockGenerator>,
    pub database: Arc<MockDatabase>,
    pub settings: Arc<SettingsStore>,
    pub orchestrator: QueryOrchestrator,
    pub context: ConversationContext,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default settings and the customers database.
    pub fn new() -> Result<Self, QueryGateError> {
        Self::builder().build()
    }

    /// Run `question` through the orchestrator with the harness context.
    pub async fn ask(&self, question: &str) -> ExecutionResult {
        self.orchestrator.process(question, &self.context).await
    }
}
