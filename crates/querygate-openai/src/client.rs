// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI Chat Completions API.

use std::time::Duration;

use querygate_context::Prompt;
use querygate_core::{ErrorClass, QueryGateError};
use querygate_guard::redact;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatMessage, ChatRequest, ChatResponse, TEMPERATURE};

/// Chat Completions client with bearer authentication.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, QueryGateError> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| QueryGateError::Config(format!("invalid API key header value: {e}")))?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| QueryGateError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                class: Some(ErrorClass::Permanent),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends the prompt as a system + user message pair and returns the reply text.
    pub async fn complete(&self, prompt: &Prompt) -> Result<String, QueryGateError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompt.system.as_str()),
                ChatMessage::user(prompt.user.as_str()),
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "chat completion response received");
        let body = response.text().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => api_err.error.message,
                Err(_) => body,
            };
            return Err(QueryGateError::classified(
                format!(
                    "OpenAI API error ({status}): {}",
                    redact(&detail, std::slice::from_ref(&self.api_key))
                ),
                ErrorClass::from_http_status(status.as_u16()),
            ));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| QueryGateError::Provider {
                message: format!("failed to parse OpenAI response: {e}"),
                class: None,
                source: Some(Box::new(e)),
            })?;

        parsed
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| QueryGateError::provider("OpenAI response contained no content"))
    }

    fn send_error(&self, e: reqwest::Error) -> QueryGateError {
        if e.is_timeout() {
            return QueryGateError::Timeout {
                duration: self.timeout,
            };
        }
        QueryGateError::Transport {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}
