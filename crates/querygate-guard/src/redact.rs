// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret redaction for provider error text before it is logged or shown.
//!
//! Known credential formats are matched by pattern; configured keys are
//! additionally replaced verbatim.

use std::sync::LazyLock;

use regex::Regex;

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // OpenAI style: sk-..., sk-proj-...
        r"sk-[A-Za-z0-9_\-]{20,}",
        // Google API keys
        r"AIza[0-9A-Za-z_\-]{35}",
        // Authorization headers
        r"Bearer\s+[A-Za-z0-9._\-]{10,}",
        // Credentials passed as query parameters (?key=..., &api_key=...)
        r"(?i)([?&](?:api_)?key=)[^&\s]+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("redaction pattern is valid"))
    .collect()
});

const REDACTED: &str = "[REDACTED]";

/// Redact credentials from `input`.
///
/// `known_secrets` are replaced exactly, longest first so a secret that
/// contains another is not partially revealed.
pub fn redact(input: &str, known_secrets: &[String]) -> String {
    let mut result = input.to_string();

    for pattern in PATTERNS.iter() {
        let replacement = if pattern.captures_len() > 1 {
            format!("${{1}}{REDACTED}")
        } else {
            REDACTED.to_string()
        };
        result = pattern.replace_all(&result, replacement.as_str()).into_owned();
    }

    let mut secrets: Vec<&String> = known_secrets.iter().filter(|s| !s.is_empty()).collect();
    secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
    for secret in secrets {
        result = result.replace(secret.as_str(), REDACTED);
    }

    result
}
