// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrow SQL inspection interface used by the schema and row-limit rules.
//!
//! [`RegexInspector`] is a tolerant heuristic, not a parser: it can miss
//! tables hidden in unusual syntax and can reject legitimate subqueries.

use std::sync::LazyLock;

use regex::Regex;

/// `FROM x`, `FROM s.x`, `JOIN [s].[x]`. The last non-empty group is the table.
static TABLE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bFROM\s+(?:\[?(\w+)\]?\.)?(?:\[?(\w+)\]?)\b|\bJOIN\s+(?:\[?(\w+)\]?\.)?(?:\[?(\w+)\]?)\b",
    )
    .expect("table reference pattern is valid")
});

/// `SELECT [DISTINCT] TOP n` or `SELECT [DISTINCT] TOP (n)`.
static TOP_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bSELECT\s+(?:DISTINCT\s+)?TOP\s*\(\s*([0-9]+)\s*\)|\bSELECT\s+(?:DISTINCT\s+)?TOP\s+([0-9]+)",
    )
    .expect("TOP clause pattern is valid")
});

/// The first `SELECT`, its trailing whitespace and an optional `DISTINCT`.
static SELECT_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bSELECT\b\s*(?:DISTINCT\b\s*)?").expect("SELECT head pattern is valid")
});

/// A row-limit clause found in a statement.
///
/// `TOP n PERCENT` is read as `n` rows; the percentage form is not
/// recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopClause {
    /// The limit, saturated at `u64::MAX` when the literal overflows.
    pub rows: u64,
    /// The digits as written.
    pub literal: String,
}

/// Extracts the structural facts the validation rules need from SQL text.
pub trait SqlInspector: Send + Sync {
    /// Table names referenced by `FROM`/`JOIN`, schema qualifier stripped.
    fn referenced_tables(&self, sql: &str) -> Vec<String>;

    /// The statement's row-limit clause, if any.
    fn top_clause(&self, sql: &str) -> Option<TopClause>;

    /// Byte offset where a `TOP n` clause would be inserted: after the first
    /// `SELECT` and an optional `DISTINCT`, past any whitespace.
    fn select_list_start(&self, sql: &str) -> Option<usize>;
}

/// Regex-based [`SqlInspector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexInspector;

impl SqlInspector for RegexInspector {
    fn referenced_tables(&self, sql: &str) -> Vec<String> {
        TABLE_REF
            .captures_iter(sql)
            .filter_map(|caps| {
                caps.iter()
                    .skip(1)
                    .flatten()
                    .filter(|m| !m.as_str().is_empty())
                    .last()
                    .map(|m| m.as_str().to_string())
            })
            .collect()
    }

    fn top_clause(&self, sql: &str) -> Option<TopClause> {
        let caps = TOP_CLAUSE.captures(sql)?;
        let digits = caps.get(1).or_else(|| caps.get(2))?.as_str();
        Some(TopClause {
            rows: digits.parse().unwrap_or(u64::MAX),
            literal: digits.to_string(),
        })
    }

    fn select_list_start(&self, sql: &str) -> Option<usize> {
        SELECT_HEAD.find(sql).map(|m| m.end())
    }
}
