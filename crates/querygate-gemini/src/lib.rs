// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini SQL generator for Querygate.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use querygate_config::QueryGateConfig;
use querygate_context::{build_prompt, detect_language, parse_response};
use querygate_core::{ConversationContext, GenerationResult, QueryGateError, Schema, SqlGenerator};
use tracing::{debug, info};

use crate::client::GeminiClient;

/// Gemini-backed generator.
///
/// API key resolution order: config -> `GEMINI_API_KEY` env var -> error.
pub struct GeminiGenerator {
    client: GeminiClient,
}

impl GeminiGenerator {
    pub fn new(config: &QueryGateConfig) -> Result<Self, QueryGateError> {
        let api_key = resolve_api_key(&config.gemini.api_key)?;
        let client = GeminiClient::new(
            api_key,
            config.gemini.model.clone(),
            config.gemini.base_url.clone(),
            Duration::from_secs(config.bot.request_timeout_secs),
        )?;

        info!(model = config.gemini.model, "Gemini generator initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl SqlGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        question: &str,
        schema: &Schema,
        context: &ConversationContext,
    ) -> Result<GenerationResult, QueryGateError> {
        let language = detect_language(question);
        let prompt = build_prompt(question, schema, context, language);
        debug!(model = self.client.model(), %language, "requesting SQL from Gemini");

        let reply = self.client.complete(&prompt).await?;
        Ok(parse_response(&reply, language))
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, QueryGateError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            QueryGateError::Config(
                "Gemini API key not found. Set gemini.api_key in config or GEMINI_API_KEY environment variable.".into(),
            )
        })
}
