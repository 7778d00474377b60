// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Querygate SQL gateway.

use thiserror::Error;

use crate::types::ViolationCode;

/// Typed retry classification attached to provider errors.
///
/// Generators that understand the failure (for example from an HTTP status)
/// set it; unclassified errors fall back to message keyword matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate limiting, overload, upstream 5xx. Worth another attempt.
    Transient,
    /// Bad credentials, malformed request, unknown model. Never retried.
    Permanent,
}

impl ErrorClass {
    /// Classifies a non-success HTTP status returned by a model API.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 | 500 | 502 | 503 | 504 => Self::Transient,
            _ => Self::Permanent,
        }
    }
}

/// The primary error type used across all Querygate traits and core operations.
#[derive(Debug, Error)]
pub enum QueryGateError {
    /// Configuration errors (invalid TOML, unknown provider, missing credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// LLM provider errors (API failure, malformed response, exhausted retries).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        class: Option<ErrorClass>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport-level failure talking to a provider (connect, DNS, TLS, reset).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out or was cancelled.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Policy rejection of candidate SQL.
    #[error("{message}")]
    Validation { code: ViolationCode, message: String },

    /// Generated SQL is inconsistent with the live database structure.
    #[error("structural error: {0}")]
    Structural(String),

    /// Storage backend errors (connection failure, introspection, cache I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Query execution failed at runtime.
    #[error("execution error: {message}")]
    Execution {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QueryGateError {
    /// Shorthand for an unclassified provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            class: None,
            source: None,
        }
    }

    /// Shorthand for a provider error with a known retry classification.
    pub fn classified(message: impl Into<String>, class: ErrorClass) -> Self {
        Self::Provider {
            message: message.into(),
            class: Some(class),
            source: None,
        }
    }

    /// Wraps any error as a storage error.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Returns true for errors that originate from the generator side
    /// (provider, transport, timeout).
    pub fn is_provider_side(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::Transport { .. } | Self::Timeout { .. }
        )
    }
}
