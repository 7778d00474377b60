// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of results and schema snapshots.

use std::fmt::Write;

use querygate_core::{ExecutionResult, QueryOutcome, Schema, TabularResult};

/// Cells longer than this are cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 40;

/// Render rows as an aligned text table with a header rule.
pub fn render_table(table: &TabularResult) -> String {
    if table.columns.is_empty() {
        return "(no columns)\n".to_string();
    }

    let header: Vec<String> = table.columns.iter().map(|c| clip(&c.name)).collect();
    let body: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|v| clip(&v.to_string())).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &body {
        push_row(&mut out, row, &widths);
    }

    let rows = table.row_count();
    let _ = writeln!(out, "({rows} {})", if rows == 1 { "row" } else { "rows" });
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

fn clip(text: &str) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= MAX_CELL_WIDTH {
        single_line
    } else {
        let cut: String = single_line.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{cut}…")
    }
}

/// One block per table: `schema.name`, then `name type [PK] [NULL]` lines.
pub fn render_schema(schema: &Schema) -> String {
    if schema.is_empty() {
        return "(no tables)\n".to_string();
    }

    let mut out = String::new();
    for table in &schema.tables {
        let _ = writeln!(out, "{}", table.qualified_name());
        for column in &table.columns {
            let mut flags = Vec::new();
            if table.primary_keys.contains(&column.name) {
                flags.push("PK");
            }
            if column.identity {
                flags.push("IDENTITY");
            }
            if column.nullable {
                flags.push("NULL");
            }
            let _ = writeln!(
                out,
                "  {} {}{}{}",
                column.name,
                column.data_type,
                if flags.is_empty() { "" } else { " " },
                flags.join(" ")
            );
        }
    }
    if !schema.relationships.is_empty() {
        out.push_str("relationships\n");
        for rel in &schema.relationships {
            let _ = writeln!(
                out,
                "  {}.{} -> {}.{}",
                rel.from_table, rel.from_column, rel.to_table, rel.to_column
            );
        }
    }
    out
}

/// A one-line summary suitable for recording as the system's turn.
pub fn summarize(result: &ExecutionResult) -> String {
    match &result.outcome {
        QueryOutcome::Success(_) => format!(
            "Returned {} rows in {} ms. SQL: {}",
            result.row_count,
            result.elapsed.as_millis(),
            result.sql
        ),
        QueryOutcome::Clarification { question } => question.clone(),
        QueryOutcome::Failure(failure) => failure.message.clone(),
    }
}
