// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered, fail-fast rule chain.
//!
//! Order matters: the schema rule relies on the comment rule having already
//! excluded comments that could hide a table reference, and the cheap textual
//! checks run before the schema-aware ones.

use std::sync::Arc;

use querygate_core::{Schema, ValidationOutcome, Violation};
use tracing::{debug, warn};

use crate::inspect::{RegexInspector, SqlInspector};
use crate::rules::{
    DangerousFunctionRule, NoCommentRule, NoSemicolonRule, RowLimitRule, SchemaMembershipRule,
    SelectOnlyRule,
};

/// A single, pure check over candidate SQL.
pub trait ValidationRule: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Passes, or rejects with a code and a non-empty message.
    fn validate(&self, sql: &str, schema: &Schema) -> Result<(), Violation>;
}

/// Runs rules in order and returns the first rejection.
pub struct ValidationPipeline {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationPipeline {
    /// The standard six-rule pipeline with the regex inspector.
    pub fn new(max_rows: u64) -> Self {
        Self::with_inspector(max_rows, Arc::new(RegexInspector))
    }

    /// The standard six-rule pipeline with a custom inspector.
    pub fn with_inspector(max_rows: u64, inspector: Arc<dyn SqlInspector>) -> Self {
        Self::from_rules(vec![
            Box::new(SelectOnlyRule),
            Box::new(NoSemicolonRule),
            Box::new(NoCommentRule),
            Box::new(DangerousFunctionRule),
            Box::new(SchemaMembershipRule::new(Arc::clone(&inspector))),
            Box::new(RowLimitRule::new(max_rows, inspector)),
        ])
    }

    /// A pipeline over an explicit rule list.
    pub fn from_rules(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    /// Append a rule; it runs after all existing rules.
    pub fn push(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, sql: &str, schema: &Schema) -> ValidationOutcome {
        debug!(sql, "validating generated SQL");

        for rule in &self.rules {
            if let Err(violation) = rule.validate(sql, schema) {
                warn!(
                    rule = rule.name(),
                    code = %violation.code,
                    message = %violation.message,
                    "SQL rejected"
                );
                return ValidationOutcome::Rejected(violation);
            }
        }

        debug!("SQL validation passed");
        ValidationOutcome::Passed
    }
}
