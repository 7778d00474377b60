// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the query state machine over mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use querygate_agent::STRUCTURAL_ISSUES;
use querygate_core::{
    ErrorClass, FailureKind, Language, Parameters, QueryGateError, QueryStage, SqlValue,
    ViolationCode,
};
use querygate_resilience::RetryingGenerator;
use querygate_test_utils::{MockDatabase, MockGenerator, TestHarness};

#[tokio::test]
async fn compliant_query_runs_unchanged() {
    let harness = TestHarness::new().unwrap();
    let mut params = Parameters::new();
    params.insert("city".into(), SqlValue::Text("Delhi".into()));
    harness
        .generator
        .push_sql("SELECT TOP 10 * FROM Customers WHERE City = @city", params.clone())
        .await;

    let result = harness.ask("customers in Delhi").await;

    assert!(result.is_success(), "got: {result:?}");
    assert!(!result.requires_clarification());
    assert_eq!(result.sql, "SELECT TOP 10 * FROM Customers WHERE City = @city");
    assert_eq!(result.parameters, params);
    assert_eq!(result.row_count, 2);
    assert_eq!(result.results().unwrap().columns.len(), 3);

    let checked = harness.database.checked().await;
    assert_eq!(checked, vec![result.sql.clone()]);
    let executed = harness.database.executed().await;
    assert_eq!(executed, vec![(result.sql.clone(), params)]);
    assert_eq!(harness.generator.questions().await, vec!["customers in Delhi"]);
}

#[tokio::test]
async fn clarification_short_circuits() {
    let harness = TestHarness::new().unwrap();
    harness.generator.push_clarification("Which city?").await;

    let result = harness.ask("show me them").await;

    assert!(!result.is_success());
    assert!(result.requires_clarification());
    assert_eq!(result.clarification_question(), Some("Which city?"));
    assert!(result.failure().is_none());
    assert!(result.sql.is_empty());
    assert!(harness.database.checked().await.is_empty());
    assert!(harness.database.executed().await.is_empty());
}

#[tokio::test]
async fn blank_clarification_gets_default_question() {
    let harness = TestHarness::new().unwrap();
    harness.generator.push_clarification("  ").await;

    let result = harness.ask("?").await;
    assert_eq!(
        result.clarification_question(),
        Some("Could you please provide more details?")
    );
}

#[tokio::test]
async fn missing_top_is_a_validation_failure() {
    let harness = TestHarness::new().unwrap();
    harness
        .generator
        .push_sql("SELECT * FROM Customers", Parameters::new())
        .await;

    let result = harness.ask("all customers").await;
    let failure = result.failure().unwrap();

    assert_eq!(failure.kind, FailureKind::Validation);
    assert_eq!(failure.code, Some(ViolationCode::RowLimitViolation));
    assert_eq!(failure.stage, QueryStage::Generated);
    assert!(!failure.message.is_empty());
    assert!(!result.requires_clarification());
    assert!(harness.database.checked().await.is_empty());
    assert!(harness.database.executed().await.is_empty());
}

#[tokio::test]
async fn validation_codes_reach_the_caller() {
    let cases = [
        ("DELETE FROM Customers", ViolationCode::SelectOnlyViolation),
        ("SELECT TOP 10 * FROM Customers; SELECT 1", ViolationCode::SemicolonViolation),
        ("SELECT TOP 10 * FROM Customers -- all", ViolationCode::CommentViolation),
        ("SELECT TOP 10 * FROM Ghost", ViolationCode::SchemaViolation),
        ("SELECT TOP 5000 * FROM Customers", ViolationCode::RowLimitExceeded),
    ];

    for (sql, code) in cases {
        let harness = TestHarness::new().unwrap();
        harness.generator.push_sql(sql, Parameters::new()).await;
        let result = harness.ask("q").await;
        assert_eq!(result.failure().and_then(|f| f.code), Some(code), "sql: {sql}");
        assert!(harness.database.executed().await.is_empty());
    }
}

#[tokio::test]
async fn row_cap_follows_settings() {
    let harness = TestHarness::new().unwrap();
    harness.settings.set_setting("bot.max_rows", 20).unwrap();
    harness
        .generator
        .push_sql("SELECT TOP 50 * FROM Customers", Parameters::new())
        .await;

    let result = harness.ask("q").await;
    assert_eq!(
        result.failure().and_then(|f| f.code),
        Some(ViolationCode::RowLimitExceeded)
    );
}

#[tokio::test]
async fn structural_rejection_skips_execution() {
    let harness = TestHarness::new().unwrap();
    harness.database.set_structure_ok(false);
    harness
        .generator
        .push_sql("SELECT TOP 10 Missing FROM Customers", Parameters::new())
        .await;

    let result = harness.ask("q").await;
    let failure = result.failure().unwrap();

    assert_eq!(failure.kind, FailureKind::Structural);
    assert_eq!(failure.stage, QueryStage::LimitEnforced);
    assert_eq!(failure.message, STRUCTURAL_ISSUES);
    assert_eq!(harness.database.checked().await.len(), 1);
    assert!(harness.database.executed().await.is_empty());
}

#[tokio::test]
async fn provider_errors_are_prefixed_and_redacted() {
    let mut config = querygate_config::QueryGateConfig::default();
    config.openai.api_key = Some("my-very-private-key".into());
    let harness = TestHarness::builder().with_config(config).build().unwrap();
    harness
        .generator
        .push_error(QueryGateError::classified(
            "invalid API key my-very-private-key",
            ErrorClass::Permanent,
        ))
        .await;

    let result = harness.ask("q").await;
    let failure = result.failure().unwrap();

    assert_eq!(failure.kind, FailureKind::Provider);
    assert_eq!(failure.stage, QueryStage::SchemaLoaded);
    assert!(failure.message.starts_with("AI service error: invalid API key"));
    assert!(!failure.message.contains("my-very-private-key"));
}

#[tokio::test]
async fn thrown_validation_error_is_prefixed() {
    let harness = TestHarness::new().unwrap();
    harness
        .generator
        .push_error(QueryGateError::Validation {
            code: ViolationCode::CommentViolation,
            message: "SQL comments are not allowed".into(),
        })
        .await;

    let result = harness.ask("q").await;
    let failure = result.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Validation);
    assert_eq!(failure.message, "Query validation error: SQL comments are not allowed");
    assert_eq!(failure.code, Some(ViolationCode::CommentViolation));
}

#[tokio::test]
async fn execution_error_is_unexpected() {
    let harness = TestHarness::new().unwrap();
    harness.database.fail_execution("disk I/O error").await;
    harness
        .generator
        .push_sql("SELECT TOP 10 * FROM Customers", Parameters::new())
        .await;

    let result = harness.ask("q").await;
    let failure = result.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Unexpected);
    assert_eq!(failure.stage, QueryStage::StructureChecked);
    assert!(failure.message.starts_with("An unexpected error occurred: "));
    assert!(failure.message.contains("disk I/O error"));
    assert_eq!(result.sql, "SELECT TOP 10 * FROM Customers");
}

#[tokio::test]
async fn generator_panic_is_contained() {
    let harness = TestHarness::new().unwrap();
    harness.generator.push_panic("generator exploded").await;

    let result = harness.ask("q").await;
    let failure = result.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Unexpected);
    assert_eq!(failure.stage, QueryStage::SchemaLoaded);
    assert_eq!(
        failure.message,
        "An unexpected error occurred: generator exploded"
    );

    // The orchestrator is still usable afterwards.
    harness
        .generator
        .push_sql("SELECT TOP 10 * FROM Customers", Parameters::new())
        .await;
    assert!(harness.ask("again").await.is_success());
}

#[tokio::test]
async fn empty_schema_skips_membership_check() {
    let database = MockDatabase::new(Default::default(), Default::default());
    let harness = TestHarness::builder().with_database(database).build().unwrap();
    harness
        .generator
        .push_sql("SELECT TOP 10 * FROM Ghost", Parameters::new())
        .await;

    let result = harness.ask("q").await;
    assert!(result.is_success(), "got: {result:?}");
    assert_eq!(result.row_count, 0);
}

#[tokio::test]
async fn language_comes_from_the_generation() {
    let harness = TestHarness::new().unwrap();
    harness
        .generator
        .push_result(Ok(querygate_core::GenerationResult::with_sql(
            "SELECT TOP 10 * FROM Customers",
            Parameters::new(),
            Language::Hinglish,
        )))
        .await;

    let result = harness.ask("saare customers dikhao").await;
    assert_eq!(result.language, Language::Hinglish);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_inside_the_orchestrator() {
    let mock = Arc::new(MockGenerator::new());
    for _ in 0..3 {
        mock.push_error(QueryGateError::classified("503 service unavailable", ErrorClass::Transient))
            .await;
    }
    mock.push_sql("SELECT TOP 10 * FROM Customers", Parameters::new())
        .await;

    let harness = TestHarness::builder()
        .with_generator(Arc::new(RetryingGenerator::new(Arc::clone(&mock) as _)))
        .build()
        .unwrap();

    let result = harness.ask("q").await;
    assert!(result.is_success(), "got: {result:?}");
    assert_eq!(mock.calls(), 4);
    // 1s + 2s + 4s of backoff, measured on the paused clock.
    assert!(result.elapsed >= Duration::from_secs(7), "elapsed: {:?}", result.elapsed);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_surface_as_provider_failure() {
    let mock = Arc::new(MockGenerator::new());
    for _ in 0..4 {
        mock.push_error(QueryGateError::Transport {
            message: "connection reset".into(),
            source: None,
        })
        .await;
    }

    let harness = TestHarness::builder()
        .with_generator(Arc::new(RetryingGenerator::new(Arc::clone(&mock) as _)))
        .build()
        .unwrap();

    let result = harness.ask("q").await;
    let failure = result.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Provider);
    assert!(
        failure
            .message
            .starts_with("AI service error: Failed to generate SQL after multiple attempts"),
        "got: {}",
        failure.message
    );
    assert_eq!(mock.calls(), 4);
}
