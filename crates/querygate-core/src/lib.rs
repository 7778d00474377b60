// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Querygate natural-language SQL gateway.
//!
//! This crate provides the shared error type, the data model exchanged between
//! generators, the validation pipeline and the orchestrator, and the traits
//! implemented by the pluggable collaborators (SQL generators, schema providers
//! and query executors).

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorClass, QueryGateError};
pub use types::{
    ConversationContext, ConversationMessage, ExecutionResult, FailureKind, GenerationResult,
    Language, Parameters, ProviderKind, QueryFailure, QueryOutcome, QueryStage, Role, Schema,
    SessionValue, SqlValue, TabularResult, ValidationOutcome, Violation, ViolationCode,
};

pub use traits::{QueryExecutor, SchemaProvider, SqlGenerator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_gate_error_has_all_variants() {
        let _config = QueryGateError::Config("test".into());
        let _provider = QueryGateError::Provider {
            message: "test".into(),
            class: None,
            source: None,
        };
        let _transport = QueryGateError::Transport {
            message: "test".into(),
            source: None,
        };
        let _timeout = QueryGateError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _validation = QueryGateError::Validation {
            code: ViolationCode::SemicolonViolation,
            message: "test".into(),
        };
        let _structural = QueryGateError::Structural("test".into());
        let _storage = QueryGateError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _execution = QueryGateError::Execution {
            message: "test".into(),
            source: None,
        };
        let _internal = QueryGateError::Internal("test".into());
    }

    #[test]
    fn provider_kind_parses_case_insensitively() {
        use std::str::FromStr;

        assert_eq!(ProviderKind::from_str("OpenAI").unwrap(), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::from_str("GEMINI").unwrap(), ProviderKind::Gemini);
        assert_eq!(ProviderKind::from_str("ollama").unwrap(), ProviderKind::Ollama);
        assert!(ProviderKind::from_str("claude").is_err());

        for kind in ProviderKind::ALL {
            let parsed = ProviderKind::from_str(&kind.to_string()).expect("should parse back");
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn provider_kind_serde_roundtrip_and_rejection() {
        let json = serde_json::to_string(&ProviderKind::Gemini).unwrap();
        assert_eq!(json, "\"gemini\"");
        let parsed: ProviderKind = serde_json::from_str("\"OpenAI\"").unwrap();
        assert_eq!(parsed, ProviderKind::OpenAi);

        let err = serde_json::from_str::<ProviderKind>("\"bard\"").unwrap_err();
        assert!(err.to_string().contains("bard"), "got: {err}");
    }

    #[test]
    fn violation_codes_render_in_screaming_snake_case() {
        assert_eq!(ViolationCode::SelectOnlyViolation.to_string(), "SELECT_ONLY_VIOLATION");
        assert_eq!(ViolationCode::SemicolonViolation.to_string(), "SEMICOLON_VIOLATION");
        assert_eq!(ViolationCode::CommentViolation.to_string(), "COMMENT_VIOLATION");
        assert_eq!(
            ViolationCode::DangerousFunctionViolation.to_string(),
            "DANGEROUS_FUNCTION_VIOLATION"
        );
        assert_eq!(ViolationCode::SchemaViolation.to_string(), "SCHEMA_VIOLATION");
        assert_eq!(ViolationCode::RowLimitViolation.to_string(), "ROW_LIMIT_VIOLATION");
        assert_eq!(ViolationCode::RowLimitExceeded.to_string(), "ROW_LIMIT_EXCEEDED");
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _generator(_: &dyn SqlGenerator) {}
        fn _schema(_: &dyn SchemaProvider) {}
        fn _executor(_: &dyn QueryExecutor) {}
    }
}
