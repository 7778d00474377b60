// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI SQL generator for Querygate.
//!
//! Implements [`SqlGenerator`] on top of the Chat Completions API. The prompt
//! is split into a system message (role and rules) and a user message
//! (schema, question, history).

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use querygate_config::QueryGateConfig;
use querygate_context::{build_prompt, detect_language, parse_response};
use querygate_core::{ConversationContext, GenerationResult, QueryGateError, Schema, SqlGenerator};
use tracing::{debug, info};

use crate::client::OpenAiClient;

/// OpenAI-backed generator.
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiGenerator {
    client: OpenAiClient,
}

impl OpenAiGenerator {
    pub fn new(config: &QueryGateConfig) -> Result<Self, QueryGateError> {
        let api_key = resolve_api_key(&config.openai.api_key)?;
        let client = OpenAiClient::new(
            api_key,
            config.openai.model.clone(),
            config.openai.base_url.clone(),
            Duration::from_secs(config.bot.request_timeout_secs),
        )?;

        info!(model = config.openai.model, "OpenAI generator initialized");
        Ok(Self { client })
    }

    #[cfg(test)]
    fn from_client(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SqlGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        question: &str,
        schema: &Schema,
        context: &ConversationContext,
    ) -> Result<GenerationResult, QueryGateError> {
        let language = detect_language(question);
        let prompt = build_prompt(question, schema, context, language);
        debug!(model = self.client.model(), %language, "requesting SQL from OpenAI");

        let reply = self.client.complete(&prompt).await?;
        Ok(parse_response(&reply, language))
    }
}

/// Resolves the API key: non-empty config value first, then `OPENAI_API_KEY`.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, QueryGateError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            QueryGateError::Config(
                "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
            )
        })
}
