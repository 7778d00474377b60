// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapts the generated `SELECT TOP n` dialect to SQLite.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// A leading `SELECT [DISTINCT] TOP n` or `TOP (n)`.
static LEADING_TOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(\s*SELECT\s+(?:DISTINCT\s+)?)TOP\s*(?:\(\s*([0-9]+)\s*\)|([0-9]+))\s*")
        .expect("leading TOP pattern is valid")
});

/// Rewrites the statement's leading `TOP n` into a trailing `LIMIT n`.
///
/// A trailing `;` is dropped so the clause lands inside the statement.
/// Statements without a leading `TOP` are returned unchanged.
pub fn to_sqlite(sql: &str) -> Cow<'_, str> {
    let Some(caps) = LEADING_TOP.captures(sql) else {
        return Cow::Borrowed(sql);
    };
    let (Some(whole), Some(head), Some(rows)) =
        (caps.get(0), caps.get(1), caps.get(2).or_else(|| caps.get(3)))
    else {
        return Cow::Borrowed(sql);
    };

    let rest = sql[whole.end()..].trim_end().trim_end_matches(';').trim_end();
    Cow::Owned(format!(
        "{}{} LIMIT {}",
        head.as_str(),
        rest,
        rows.as_str()
    ))
}
