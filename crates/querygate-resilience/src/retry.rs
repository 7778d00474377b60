// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry decorator with a fixed 1s/2s/4s backoff schedule.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use querygate_core::{
    ConversationContext, ErrorClass, GenerationResult, QueryGateError, Schema, SqlGenerator,
};
use querygate_guard::redact;
use tracing::{error, info, warn};

/// Message fragments that mark an unclassified provider error as transient.
pub const RETRYABLE_MARKERS: &[&str] = &[
    "rate limit",
    "timeout",
    "service unavailable",
    "internal server error",
    "502",
    "503",
    "504",
];

/// Delays between attempts. The number of delays is the number of retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }

    pub fn max_retries(&self) -> usize {
        self.delays.len()
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl Default for RetryPolicy {
    /// Three retries, waiting 1s, 2s and 4s.
    fn default() -> Self {
        Self::new(vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
        ])
    }
}

/// Whether a generator error is worth another attempt.
///
/// Transport failures and timeouts always are. Provider errors follow their
/// typed class when the generator set one, and fall back to matching
/// [`RETRYABLE_MARKERS`] in the message otherwise. Everything else is final.
pub fn is_retryable(err: &QueryGateError) -> bool {
    match err {
        QueryGateError::Transport { .. } | QueryGateError::Timeout { .. } => true,
        QueryGateError::Provider {
            class: Some(class), ..
        } => *class == ErrorClass::Transient,
        QueryGateError::Provider {
            message,
            class: None,
            ..
        } => {
            let lowered = message.to_lowercase();
            RETRYABLE_MARKERS.iter().any(|m| lowered.contains(m))
        }
        _ => false,
    }
}

/// Decorates a generator with retries.
pub struct RetryingGenerator {
    inner: Arc<dyn SqlGenerator>,
    policy: RetryPolicy,
}

impl RetryingGenerator {
    pub fn new(inner: Arc<dyn SqlGenerator>) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    pub fn with_policy(inner: Arc<dyn SqlGenerator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl SqlGenerator for RetryingGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        question: &str,
        schema: &Schema,
        context: &ConversationContext,
    ) -> Result<GenerationResult, QueryGateError> {
        let mut retries = 0usize;

        loop {
            let err = match self.inner.generate(question, schema, context).await {
                Ok(result) => {
                    if retries > 0 {
                        info!(generator = self.name(), retries, "generation recovered after retry");
                    }
                    return Ok(result);
                }
                Err(err) => err,
            };

            if !is_retryable(&err) {
                return Err(err);
            }

            let Some(delay) = self.policy.delays.get(retries).copied() else {
                let attempts = retries + 1;
                error!(
                    generator = self.name(),
                    attempts,
                    error = %redact(&err.to_string(), &[]),
                    "giving up on SQL generation"
                );
                return Err(QueryGateError::Provider {
                    message: format!("Failed to generate SQL after multiple attempts: {err}"),
                    class: Some(ErrorClass::Permanent),
                    source: Some(Box::new(err)),
                });
            };

            retries += 1;
            warn!(
                generator = self.name(),
                attempt = retries,
                delay_ms = delay.as_millis() as u64,
                error = %redact(&err.to_string(), &[]),
                "transient generation failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
