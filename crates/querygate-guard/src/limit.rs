// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-limit enforcement: the second line of defense after validation.

use std::borrow::Cow;

use crate::inspect::SqlInspector;

/// Insert `TOP <max_rows>` after the first `SELECT` (and `DISTINCT`) when the
/// statement has no row-limit clause.
///
/// Idempotent: presence is detected with the same pattern the row-limit rule
/// uses, so SQL that already carries a `TOP` clause is returned unchanged.
/// Text with no `SELECT` is also returned unchanged.
pub fn enforce_row_limit<'a>(
    sql: &'a str,
    max_rows: u64,
    inspector: &dyn SqlInspector,
) -> Cow<'a, str> {
    if inspector.top_clause(sql).is_some() {
        return Cow::Borrowed(sql);
    }

    let Some(at) = inspector.select_list_start(sql) else {
        return Cow::Borrowed(sql);
    };

    let (head, tail) = sql.split_at(at);
    let separator = if head.ends_with(char::is_whitespace) {
        ""
    } else {
        " "
    };
    tracing::debug!(max_rows, "injecting row limit");
    Cow::Owned(format!("{head}{separator}TOP {max_rows} {tail}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::RegexInspector;

    #[test]
    fn inserts_after_select() {
        assert_eq!(
            enforce_row_limit("SELECT * FROM Customers", 1000, &RegexInspector),
            "SELECT TOP 1000 * FROM Customers"
        );
    }

    #[test]
    fn inserts_after_distinct() {
        assert_eq!(
            enforce_row_limit("select distinct City from Customers", 50, &RegexInspector),
            "select distinct TOP 50 City from Customers"
        );
    }

    #[test]
    fn keeps_existing_top() {
        let sql = "SELECT TOP 10 * FROM Customers";
        assert!(matches!(
            enforce_row_limit(sql, 1000, &RegexInspector),
            Cow::Borrowed(s) if s == sql
        ));
    }

    #[test]
    fn column_named_top_does_not_count_as_limit() {
        // "TOP " appears but not as a row-limit clause.
        assert_eq!(
            enforce_row_limit("SELECT Name FROM Scores WHERE Tier = 'TOP 1'", 100, &RegexInspector),
            "SELECT TOP 100 Name FROM Scores WHERE Tier = 'TOP 1'"
        );
    }

    #[test]
    fn star_glued_to_select_gets_spacing() {
        assert_eq!(
            enforce_row_limit("SELECT*FROM t", 5, &RegexInspector),
            "SELECT TOP 5 *FROM t"
        );
    }

    #[test]
    fn idempotent() {
        let once = enforce_row_limit("SELECT DISTINCT a FROM t", 10, &RegexInspector).into_owned();
        let twice = enforce_row_limit(&once, 10, &RegexInspector);
        assert_eq!(once, twice);
    }

    #[test]
    fn no_select_unchanged() {
        assert_eq!(enforce_row_limit("VALUES (1)", 10, &RegexInspector), "VALUES (1)");
    }
}
