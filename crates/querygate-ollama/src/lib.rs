// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama SQL generator for Querygate.
//!
//! Talks to a local Ollama server; no credentials are involved. Ollama takes a
//! single prompt, so the system and user parts are sent combined.

pub mod client;

use std::time::Duration;

use async_trait::async_trait;
use querygate_config::QueryGateConfig;
use querygate_context::{build_prompt, detect_language, parse_response};
use querygate_core::{ConversationContext, GenerationResult, QueryGateError, Schema, SqlGenerator};
use tracing::{debug, info};

use crate::client::OllamaClient;

pub struct OllamaGenerator {
    client: OllamaClient,
}

impl OllamaGenerator {
    pub fn new(config: &QueryGateConfig) -> Result<Self, QueryGateError> {
        let client = OllamaClient::new(
            config.ollama.model.clone(),
            config.ollama.base_url.clone(),
            Duration::from_secs(config.bot.request_timeout_secs),
        )?;

        info!(
            model = config.ollama.model,
            base_url = config.ollama.base_url,
            "Ollama generator initialized"
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl SqlGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        question: &str,
        schema: &Schema,
        context: &ConversationContext,
    ) -> Result<GenerationResult, QueryGateError> {
        let language = detect_language(question);
        let prompt = build_prompt(question, schema, context, language).combined();
        debug!(
            model = self.client.model(),
            base_url = self.client.base_url(),
            %language,
            "requesting SQL from Ollama"
        );

        let reply = self.client.generate(&prompt).await?;
        Ok(parse_response(&reply, language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querygate_core::SqlValue;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(uri: &str) -> QueryGateConfig {
        let mut config = QueryGateConfig::default();
        config.ollama.base_url = uri.to_string();
        config.ollama.model = "codellama".into();
        config
    }

    #[tokio::test]
    async fn generate_sends_combined_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_string_contains("CRITICAL RULES"))
            .and(body_string_contains("Query: top products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "SQL|SELECT TOP 5 Name FROM Products WHERE Price > @min|PARAMS|min=9.5"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = OllamaGenerator::new(&config(&server.uri())).unwrap();
        assert_eq!(generator.name(), "ollama");

        let result = generator
            .generate("top products", &Schema::empty(), &ConversationContext::new())
            .await
            .unwrap();
        assert_eq!(result.sql, "SELECT TOP 5 Name FROM Products WHERE Price > @min");
        assert_eq!(result.parameters["min"], SqlValue::Real(9.5));
    }

    #[tokio::test]
    async fn generate_falls_back_to_fenced_sql() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "Sure!\n```sql\nSELECT TOP 10 * FROM Orders\n```"
            })))
            .mount(&server)
            .await;

        let generator = OllamaGenerator::new(&config(&server.uri())).unwrap();
        let result = generator
            .generate("orders", &Schema::empty(), &ConversationContext::new())
            .await
            .unwrap();
        assert_eq!(result.sql, "SELECT TOP 10 * FROM Orders");
    }
}
