// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! The API key travels as a `key` query parameter, so transport errors are
//! stripped of their URL before they leave this module.

use std::time::Duration;

use querygate_context::Prompt;
use querygate_core::{ErrorClass, QueryGateError};
use querygate_guard::redact;
use tracing::debug;

use crate::types::{
    ApiErrorResponse, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, QueryGateError> {
        let client = reqwest::Client::builder()
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

    pub async fn complete(&self, prompt: &Prompt) -> Result<String, QueryGateError> {
        let request = GenerateContentRequest {
            system_instruction: Content::text(None, prompt.system.as_str()),
            contents: vec![Content::text(Some("user"), prompt.user.as_str())],
            generation_config: GenerationConfig::default(),
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "generateContent response received");
        let body = response.text().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => match api_err.error.status {
                    Some(code) => format!("{code}: {}", api_err.error.message),
                    None => api_err.error.message,
                },
                Err(_) => body,
            };
            return Err(QueryGateError::classified(
                format!(
                    "Gemini API error ({status}): {}",
                    redact(&detail, std::slice::from_ref(&self.api_key))
                ),
                ErrorClass::from_http_status(status.as_u16()),
            ));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| QueryGateError::Provider {
                message: format!("failed to parse Gemini response: {e}"),
                class: None,
                source: Some(Box::new(e)),
            })?;

        parsed
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| QueryGateError::provider("Gemini response contained no candidates"))
    }

    fn send_error(&self, e: reqwest::Error) -> QueryGateError {
        if e.is_timeout() {
            return QueryGateError::Timeout {
                duration: self.timeout,
            };
        }
        let e = e.without_url();
        QueryGateError::Transport {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "AIzaSyTestKey";

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new(
            KEY.into(),
            "gemini-pro".into(),
            "https://generativelanguage.googleapis.com/v1beta".into(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base_url.to_string())
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "rules".into(),
            user: "Query: orders".into(),
        }
    }

    #[tokio::test]
    async fn complete_posts_to_model_endpoint_with_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .and(query_param("key", KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "SQL|SELECT TOP 5 * FROM Orders|PARAMS|"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = test_client(&server.uri()).complete(&prompt()).await.unwrap();
        assert_eq!(text, "SQL|SELECT TOP 5 * FROM Orders|PARAMS|");
    }

    #[tokio::test]
    async fn unavailable_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).complete(&prompt()).await.unwrap_err();
        match err {
            QueryGateError::Provider { message, class, .. } => {
                assert_eq!(class, Some(ErrorClass::Transient));
                assert!(message.contains("UNAVAILABLE: The model is overloaded."), "got: {message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_request_is_permanent_without_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": format!("API key not valid: {KEY}"), "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).complete(&prompt()).await.unwrap_err();
        assert!(!err.to_string().contains(KEY));
        assert!(matches!(
            err,
            QueryGateError::Provider {
                class: Some(ErrorClass::Permanent),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn empty_candidates_is_unclassified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).complete(&prompt()).await.unwrap_err();
        assert!(matches!(err, QueryGateError::Provider { class: None, .. }));
    }

    #[tokio::test]
    async fn transport_error_hides_key() {
        let err = test_client("http://127.0.0.1:1")
            .complete(&prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryGateError::Transport { .. }));
        assert!(!err.to_string().contains(KEY));
    }
}
