// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQL generator trait for LLM backends (OpenAI, Gemini, Ollama, ...).

use async_trait::async_trait;

use crate::error::QueryGateError;
use crate::types::{ConversationContext, GenerationResult, Schema};

/// Turns a natural-language question into candidate SQL.
///
/// Implementations are behaviorally interchangeable. They may fail with a
/// provider-classified [`QueryGateError`]; retries are layered on top by a
/// decorator and never handled here.
#[async_trait]
pub trait SqlGenerator: Send + Sync + 'static {
    /// Returns the human-readable name of this generator.
    fn name(&self) -> &str;

    /// Generates SQL (or a clarification request) for `question`.
    async fn generate(
        &self,
        question: &str,
        schema: &Schema,
        context: &ConversationContext,
    ) -> Result<GenerationResult, QueryGateError>;
}
