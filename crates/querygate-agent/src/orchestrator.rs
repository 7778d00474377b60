// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The query state machine.
//!
//! `Start → SchemaLoaded → Generated → (ClarificationNeeded | Validated →
//! LimitEnforced → StructureChecked → Executed) → Done`, with a single failure
//! exit from any state. [`QueryOrchestrator::process`] never returns an error
//! and never unwinds: errors and panics from collaborators become a failed
//! [`ExecutionResult`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use querygate_config::SettingsStore;
use querygate_context::DEFAULT_CLARIFICATION;
use querygate_core::{
    ConversationContext, ExecutionResult, FailureKind, Language, Parameters, QueryExecutor,
    QueryFailure, QueryGateError, QueryOutcome, QueryStage, SchemaProvider, ValidationOutcome,
};
use querygate_guard::{
    RegexInspector, SqlInspector, ValidationPipeline, enforce_row_limit, redact,
};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::factory::GeneratorSource;

/// Message for SQL that the database refused to prepare.
pub const STRUCTURAL_ISSUES: &str =
    "The generated SQL query has structural issues and cannot be executed safely.";

const PROVIDER_PREFIX: &str = "AI service error: ";
const VALIDATION_PREFIX: &str = "Query validation error: ";
const CONFIG_PREFIX: &str = "Configuration error: ";
const UNEXPECTED_PREFIX: &str = "An unexpected error occurred: ";

/// Environment variables that may hold provider credentials.
const KEY_VARS: &[&str] = &["OPENAI_API_KEY", "GEMINI_API_KEY"];

/// Where a request got to, kept outside the stage future so a failure or
/// panic can still report it.
struct Progress {
    stage: QueryStage,
    sql: String,
    parameters: Parameters,
    language: Language,
    row_count: usize,
}

impl Progress {
    fn new(language: Language) -> Self {
        Self {
            stage: QueryStage::Start,
            sql: String::new(),
            parameters: Parameters::new(),
            language,
            row_count: 0,
        }
    }

    fn advance(&mut self, stage: QueryStage) {
        debug!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }
}

/// Coordinates generation, validation, limit enforcement, the structural
/// pre-check and execution for one question at a time.
///
/// Holds only shared read-mostly state; concurrent `process` calls are
/// independent.
pub struct QueryOrchestrator {
    generators: Arc<dyn GeneratorSource>,
    schema: Arc<dyn SchemaProvider>,
    executor: Arc<dyn QueryExecutor>,
    settings: Arc<SettingsStore>,
    inspector: Arc<dyn SqlInspector>,
}

impl QueryOrchestrator {
    pub fn new(
        generators: Arc<dyn GeneratorSource>,
        schema: Arc<dyn SchemaProvider>,
        executor: Arc<dyn QueryExecutor>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            generators,
            schema,
            executor,
            settings,
            inspector: Arc::new(RegexInspector),
        }
    }

    /// Replace the SQL inspector used by validation and limit enforcement.
    pub fn with_inspector(mut self, inspector: Arc<dyn SqlInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    /// Run one question through the state machine.
    ///
    /// `context` is read, never modified; recording the turn is the caller's
    /// job.
    pub async fn process(&self, question: &str, context: &ConversationContext) -> ExecutionResult {
        let started = Instant::now();
        info!(question, "processing query");

        let mut progress = Progress::new(context.preferred_language);
        let attempt = AssertUnwindSafe(self.drive(question, context, &mut progress))
            .catch_unwind()
            .await;

        let outcome = match attempt {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => QueryOutcome::Failure(self.failure_from(err, progress.stage)),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(stage = %progress.stage, panic = %message, "query processing panicked");
                QueryOutcome::Failure(QueryFailure {
                    kind: FailureKind::Unexpected,
                    stage: progress.stage,
                    message: format!("{UNEXPECTED_PREFIX}{message}"),
                    code: None,
                })
            }
        };

        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        match &outcome {
            QueryOutcome::Success(_) => {
                info!(rows = progress.row_count, elapsed_ms, "query executed successfully")
            }
            QueryOutcome::Clarification { .. } => info!(elapsed_ms, "clarification requested"),
            QueryOutcome::Failure(failure) => warn!(
                kind = %failure.kind,
                stage = %failure.stage,
                elapsed_ms,
                "query failed"
            ),
        }

        ExecutionResult {
            outcome,
            sql: progress.sql,
            parameters: progress.parameters,
            language: progress.language,
            elapsed,
            row_count: progress.row_count,
        }
    }

    async fn drive(
        &self,
        question: &str,
        context: &ConversationContext,
        progress: &mut Progress,
    ) -> Result<QueryOutcome, QueryGateError> {
        let schema = self.schema.schema().await?;
        progress.advance(QueryStage::SchemaLoaded);

        let generator = self.generators.generator()?;
        let generation = generator.generate(question, &schema, context).await?;
        progress.language = generation.language;
        progress.advance(QueryStage::Generated);

        if generation.requires_clarification {
            progress.advance(QueryStage::ClarificationNeeded);
            let question = generation
                .clarification_question
                .filter(|q| !q.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CLARIFICATION.to_string());
            progress.advance(QueryStage::Done);
            return Ok(QueryOutcome::Clarification { question });
        }

        debug!(sql = %generation.sql, "generated SQL");
        progress.sql = generation.sql;
        progress.parameters = generation.parameters;

        let max_rows = self.settings.max_rows();
        let pipeline = ValidationPipeline::with_inspector(max_rows, Arc::clone(&self.inspector));
        if let ValidationOutcome::Rejected(violation) = pipeline.validate(&progress.sql, &schema) {
            warn!(code = %violation.code, message = %violation.message, "SQL validation failed");
            return Ok(QueryOutcome::Failure(QueryFailure {
                kind: FailureKind::Validation,
                stage: progress.stage,
                message: violation.message,
                code: Some(violation.code),
            }));
        }
        progress.advance(QueryStage::Validated);

        let limited = enforce_row_limit(&progress.sql, max_rows, self.inspector.as_ref()).into_owned();
        progress.sql = limited;
        progress.advance(QueryStage::LimitEnforced);

        if !self.schema.check_structure(&progress.sql).await {
            warn!(sql = %progress.sql, "SQL structure validation failed");
            return Ok(QueryOutcome::Failure(QueryFailure {
                kind: FailureKind::Structural,
                stage: progress.stage,
                message: STRUCTURAL_ISSUES.to_string(),
                code: None,
            }));
        }
        progress.advance(QueryStage::StructureChecked);

        let table = self
            .executor
            .execute(&progress.sql, &progress.parameters)
            .await?;
        progress.row_count = table.row_count();
        progress.advance(QueryStage::Executed);
        progress.advance(QueryStage::Done);
        Ok(QueryOutcome::Success(table))
    }

    /// Classify a collaborator error into a user-facing failure.
    fn failure_from(&self, err: QueryGateError, stage: QueryStage) -> QueryFailure {
        let secrets = self.known_secrets();

        let (kind, message, code) = match err {
            err if err.is_provider_side() => {
                let detail = redact(&provider_detail(&err), &secrets);
                error!(stage = %stage, error = %detail, "LLM provider error during query processing");
                (FailureKind::Provider, format!("{PROVIDER_PREFIX}{detail}"), None)
            }
            QueryGateError::Config(message) => {
                let detail = redact(&message, &secrets);
                error!(stage = %stage, error = %detail, "configuration error during query processing");
                (FailureKind::Configuration, format!("{CONFIG_PREFIX}{detail}"), None)
            }
            QueryGateError::Validation { code, message } => {
                warn!(stage = %stage, %code, "SQL validation error during query processing");
                (
                    FailureKind::Validation,
                    format!("{VALIDATION_PREFIX}{message}"),
                    Some(code),
                )
            }
            QueryGateError::Structural(detail) => {
                warn!(stage = %stage, error = %detail, "structural error during query processing");
                (FailureKind::Structural, STRUCTURAL_ISSUES.to_string(), None)
            }
            other => {
                let detail = redact(&other.to_string(), &secrets);
                error!(stage = %stage, error = %detail, "unexpected error during query processing");
                (FailureKind::Unexpected, format!("{UNEXPECTED_PREFIX}{detail}"), None)
            }
        };

        QueryFailure {
            kind,
            stage,
            message,
            code,
        }
    }

    /// Configured and environment API keys, for redaction.
    fn known_secrets(&self) -> Vec<String> {
        let config = self.settings.snapshot();
        let mut secrets: Vec<String> = [&config.openai.api_key, &config.gemini.api_key]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        secrets.extend(KEY_VARS.iter().filter_map(|var| std::env::var(var).ok()));
        secrets
    }
}

/// The message a provider-side error carries, without the category prefix.
fn provider_detail(err: &QueryGateError) -> String {
    match err {
        QueryGateError::Provider { message, .. } | QueryGateError::Transport { message, .. } => {
            message.clone()
        }
        other => other.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
