// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The built-in validation rules, in pipeline order.

use std::sync::{Arc, LazyLock};

use querygate_core::{Schema, Violation, ViolationCode};
use regex::Regex;

use crate::inspect::SqlInspector;
use crate::pipeline::ValidationRule;

static WRITE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(INSERT|UPDATE|DELETE|DROP|CREATE|ALTER|TRUNCATE|EXEC|EXECUTE|MERGE|BULK)\b")
        .expect("write keyword pattern is valid")
});

/// Line comments, and block comments whether or not they are terminated.
static COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)--.*$|(?s)/\*.*?(?:\*/|\z)").expect("comment pattern is valid")
});

/// Administrative and OS-bridging procedures and row sources.
pub const DANGEROUS_FUNCTIONS: &[&str] = &[
    "xp_cmdshell",
    "sp_configure",
    "openrowset",
    "opendatasource",
    "xp_regread",
    "xp_regwrite",
    "xp_regdelete",
    "xp_instance_regread",
    "xp_instance_regwrite",
    "xp_instance_regdelete",
    "sp_oacreate",
    "sp_oamethod",
    "sp_oagetproperty",
    "sp_oasetproperty",
    "sp_oadestroy",
];

/// Rejects DML/DDL/EXEC keywords anywhere, and anything not starting with `SELECT`.
pub struct SelectOnlyRule;

impl ValidationRule for SelectOnlyRule {
    fn name(&self) -> &'static str {
        "select_only"
    }

    fn validate(&self, sql: &str, _schema: &Schema) -> Result<(), Violation> {
        if WRITE_KEYWORDS.is_match(sql) {
            return Err(Violation::new(
                ViolationCode::SelectOnlyViolation,
                "Only SELECT statements are allowed. DML/DDL operations are prohibited.",
            ));
        }

        let head = sql.trim_start();
        let starts_with_select = head
            .get(..6)
            .is_some_and(|word| word.eq_ignore_ascii_case("select"));
        if !starts_with_select {
            return Err(Violation::new(
                ViolationCode::SelectOnlyViolation,
                "Query must start with SELECT statement.",
            ));
        }

        Ok(())
    }
}

/// Rejects statement chaining.
pub struct NoSemicolonRule;

impl ValidationRule for NoSemicolonRule {
    fn name(&self) -> &'static str {
        "no_semicolon"
    }

    fn validate(&self, sql: &str, _schema: &Schema) -> Result<(), Violation> {
        if sql.contains(';') {
            return Err(Violation::new(
                ViolationCode::SemicolonViolation,
                "Semicolons are not allowed in queries to prevent SQL injection.",
            ));
        }
        Ok(())
    }
}

/// Rejects `--` and `/* */` comments.
pub struct NoCommentRule;

impl ValidationRule for NoCommentRule {
    fn name(&self) -> &'static str {
        "no_comment"
    }

    fn validate(&self, sql: &str, _schema: &Schema) -> Result<(), Violation> {
        if COMMENT.is_match(sql) {
            return Err(Violation::new(
                ViolationCode::CommentViolation,
                "SQL comments are not allowed to prevent injection attacks.",
            ));
        }
        Ok(())
    }
}

/// Rejects any mention of a [`DANGEROUS_FUNCTIONS`] entry (substring match).
pub struct DangerousFunctionRule;

impl ValidationRule for DangerousFunctionRule {
    fn name(&self) -> &'static str {
        "dangerous_function"
    }

    fn validate(&self, sql: &str, _schema: &Schema) -> Result<(), Violation> {
        let lowered = sql.to_lowercase();
        match DANGEROUS_FUNCTIONS.iter().find(|f| lowered.contains(*f)) {
            Some(func) => Err(Violation::new(
                ViolationCode::DangerousFunctionViolation,
                format!("Dangerous function '{func}' is not allowed."),
            )),
            None => Ok(()),
        }
    }
}

/// Every `FROM`/`JOIN` table must exist in the snapshot.
///
/// Passes unconditionally when the snapshot has no tables, so the gateway
/// keeps working offline or before the first introspection.
pub struct SchemaMembershipRule {
    inspector: Arc<dyn SqlInspector>,
}

impl SchemaMembershipRule {
    pub fn new(inspector: Arc<dyn SqlInspector>) -> Self {
        Self { inspector }
    }
}

impl ValidationRule for SchemaMembershipRule {
    fn name(&self) -> &'static str {
        "schema_membership"
    }

    fn validate(&self, sql: &str, schema: &Schema) -> Result<(), Violation> {
        if schema.is_empty() {
            tracing::debug!("schema snapshot empty, skipping table membership check");
            return Ok(());
        }

        match self
            .inspector
            .referenced_tables(sql)
            .into_iter()
            .find(|table| !schema.has_table(table))
        {
            Some(missing) => Err(Violation::new(
                ViolationCode::SchemaViolation,
                format!("Table '{missing}' does not exist in the database schema."),
            )),
            None => Ok(()),
        }
    }
}

/// Requires a `TOP n` clause no larger than the configured cap.
pub struct RowLimitRule {
    max_rows: u64,
    inspector: Arc<dyn SqlInspector>,
}

impl RowLimitRule {
    pub fn new(max_rows: u64, inspector: Arc<dyn SqlInspector>) -> Self {
        Self {
            max_rows,
            inspector,
        }
    }
}

impl ValidationRule for RowLimitRule {
    fn name(&self) -> &'static str {
        "row_limit"
    }

    fn validate(&self, sql: &str, _schema: &Schema) -> Result<(), Violation> {
        let max = self.max_rows;
        match self.inspector.top_clause(sql) {
            None => Err(Violation::new(
                ViolationCode::RowLimitViolation,
                format!("Query must include a TOP clause to limit results to {max} rows or fewer."),
            )),
            Some(top) if top.rows > max => Err(Violation::new(
                ViolationCode::RowLimitExceeded,
                format!(
                    "TOP clause cannot exceed {max} rows. Current value: {}",
                    top.literal
                ),
            )),
            Some(_) => Ok(()),
        }
    }
}
