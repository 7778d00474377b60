// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of model replies into [`GenerationResult`]s.
//!
//! Models are asked to answer `SQL|<sql>|PARAMS|<k>=<v>,...` or
//! `CLARIFICATION_NEEDED|<question>`. Replies that ignore the format fall back
//! to a fenced ```` ```sql ```` block, then to the whole trimmed text.

use std::sync::LazyLock;

use querygate_core::{GenerationResult, Language, Parameters, SqlValue};
use regex::Regex;
use tracing::debug;

/// Used when a model asks for clarification without saying what it needs.
pub const DEFAULT_CLARIFICATION: &str = "Could you please provide more details?";

const CLARIFICATION_MARKER: &str = "CLARIFICATION_NEEDED";
const SQL_MARKER: &str = "SQL|";
const PARAMS_MARKER: &str = "|PARAMS|";

static SQL_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```sql\s*(.*?)\s*```").expect("fence pattern is valid"));

/// Interpret `text` as returned by a model.
pub fn parse_response(text: &str, language: Language) -> GenerationResult {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix(CLARIFICATION_MARKER) {
        let question = rest
            .split_once('|')
            .map(|(_, q)| q.trim())
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_CLARIFICATION);
        debug!("model requested clarification");
        return GenerationResult::clarification(question, language);
    }

    if let Some(rest) = text.strip_prefix(SQL_MARKER) {
        let (sql, parameters) = match rest.split_once(PARAMS_MARKER) {
            Some((sql, params)) => (sql, parse_parameters(params)),
            None => (rest.strip_suffix("|PARAMS").unwrap_or(rest), Parameters::new()),
        };
        return GenerationResult::with_sql(sql.trim(), parameters, language);
    }

    let sql = SQL_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str());
    GenerationResult::with_sql(sql.trim(), Parameters::new(), language)
}

/// `city=Delhi, @limit=10` into typed parameters. Names are stored without `@`.
fn parse_parameters(raw: &str) -> Parameters {
    raw.split(',')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim().trim_start_matches('@');
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), SqlValue::parse_literal(value)))
        })
        .collect()
}
