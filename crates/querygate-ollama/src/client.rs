// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minimal client for Ollama's non-streaming `/api/generate` endpoint.

use std::time::Duration;

use querygate_core::{ErrorClass, QueryGateError};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            num_predict: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(model: String, base_url: String, timeout: Duration) -> Result<Self, QueryGateError> {
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
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a single-prompt completion and returns the `response` text.
    pub async fn generate(&self, prompt: &str) -> Result<String, QueryGateError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions::default(),
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "ollama response received");
        let body = response.text().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(QueryGateError::classified(
                format!("Ollama API error ({status}): {detail}"),
                ErrorClass::from_http_status(status.as_u16()),
            ));
        }

        serde_json::from_str::<GenerateResponse>(&body)
            .map(|r| r.response)
            .map_err(|e| QueryGateError::Provider {
                message: format!("Ollama API error: malformed response: {e}"),
                class: None,
                source: Some(Box::new(e)),
            })
    }

    fn send_error(&self, e: reqwest::Error) -> QueryGateError {
        if e.is_timeout() {
            return QueryGateError::Timeout {
                duration: self.timeout,
            };
        }
        QueryGateError::Transport {
            message: format!("Ollama API error: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> OllamaClient {
        OllamaClient::new("llama2".into(), uri.to_string(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn sends_non_streaming_request_with_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(serde_json::json!({
                "model": "llama2",
                "prompt": "hello",
                "stream": false,
                "options": {"temperature": 0.1, "num_predict": 1000}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama2", "response": "SELECT TOP 1 * FROM t", "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server.uri()).generate("hello").await.unwrap();
        assert_eq!(text, "SELECT TOP 1 * FROM t");
    }

    #[tokio::test]
    async fn missing_model_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "model 'llama2' not found"})),
            )
            .mount(&server)
            .await;

        let err = client(&server.uri()).generate("hello").await.unwrap_err();
        assert!(err.to_string().contains("model 'llama2' not found"));
        assert!(matches!(
            err,
            QueryGateError::Provider {
                class: Some(ErrorClass::Permanent),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).generate("hello").await.unwrap_err();
        assert!(matches!(
            err,
            QueryGateError::Provider {
                class: Some(ErrorClass::Transient),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "ok"})),
            )
            .mount(&server)
            .await;

        let c = client(&format!("{}/", server.uri()));
        assert_eq!(c.generate("x").await.unwrap(), "ok");
    }
}
