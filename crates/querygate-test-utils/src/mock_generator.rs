// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock SQL generator for deterministic testing.
//!
//! `MockGenerator` implements `SqlGenerator` with a script of queued
//! outcomes, enabling orchestrator tests without any model API.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use querygate_core::{
    ConversationContext, GenerationResult, Language, Parameters, QueryGateError, Schema,
    SqlGenerator,
};

enum Step {
    Reply(Result<GenerationResult, QueryGateError>),
    Panic(String),
}

/// A generator that replays queued outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty, a
/// provider error is returned.
pub struct MockGenerator {
    steps: Arc<Mutex<VecDeque<Step>>>,
    questions: Arc<Mutex<Vec<String>>>,
    calls: AtomicUsize,
}

impl MockGenerator {
    /// Create a mock generator with an empty script.
    pub fn new() -> Self {
        Self {
            steps: Arc::new(Mutex::new(VecDeque::new())),
            questions: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock generator that answers once with `sql`.
    pub fn with_sql(sql: &str) -> Self {
        let reply = GenerationResult::with_sql(sql, Parameters::new(), Language::English);
        Self {
            steps: Arc::new(Mutex::new(VecDeque::from([Step::Reply(Ok(reply))]))),
            ..Self::new()
        }
    }

    /// Queue a SQL answer.
    pub async fn push_sql(&self, sql: &str, parameters: Parameters) {
        self.push_result(Ok(GenerationResult::with_sql(
            sql,
            parameters,
            Language::English,
        )))
        .await;
    }

    /// Queue a clarification request.
    pub async fn push_clarification(&self, question: &str) {
        self.push_result(Ok(GenerationResult::clarification(
            question,
            Language::English,
        )))
        .await;
    }

    /// Queue an error.
    pub async fn push_error(&self, err: QueryGateError) {
        self.push_result(Err(err)).await;
    }

    /// Queue any outcome.
    pub async fn push_result(&self, result: Result<GenerationResult, QueryGateError>) {
        self.steps.lock().await.push_back(Step::Reply(result));
    }

    /// Queue a panic with `message`.
    pub async fn push_panic(&self, message: &str) {
        self.steps
            .lock()
            .await
            .push_back(Step::Panic(message.to_string()));
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Questions received, in order.
    pub async fn questions(&self) -> Vec<String> {
        self.questions.lock().await.clone()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SqlGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        question: &str,
        _schema: &Schema,
        _context: &ConversationContext,
    ) -> Result<GenerationResult, QueryGateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.questions.lock().await.push(question.to_string());

        let step = self.steps.lock().await.pop_front();
        match step {
            Some(Step::Reply(result)) => result,
            Some(Step::Panic(message)) => panic!("{message}"),
            None => Err(QueryGateError::provider("mock generator has no queued response")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_when_script_is_empty() {
        let generator = MockGenerator::new();
        let err = generator
            .generate("q", &Schema::empty(), &ConversationContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no queued response"));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn queued_outcomes_returned_in_order() {
        let generator = MockGenerator::with_sql("SELECT TOP 1 * FROM t");
        generator.push_clarification("Which year?").await;
        generator
            .push_error(QueryGateError::provider("invalid API key"))
            .await;

        let context = ConversationContext::new();
        let schema = Schema::empty();
        let first = generator.generate("one", &schema, &context).await.unwrap();
        assert_eq!(first.sql, "SELECT TOP 1 * FROM t");
        let second = generator.generate("two", &schema, &context).await.unwrap();
        assert!(second.requires_clarification);
        assert!(generator.generate("three", &schema, &context).await.is_err());

        assert_eq!(generator.calls(), 3);
        assert_eq!(generator.questions().await, vec!["one", "two", "three"]);
    }
}
