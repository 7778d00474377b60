// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly shared by all generator backends.
//!
//! Chat-style APIs send [`Prompt::system`] and [`Prompt::user`] as separate
//! messages; completion-style APIs use [`Prompt::combined`].

use std::fmt::Write;

use querygate_core::{ConversationContext, Language, Schema};

/// Messages of history included in the prompt.
pub const HISTORY_WINDOW: usize = 5;

const RULES: &str = "\
CRITICAL RULES:
1. Generate ONLY SELECT statements - no INSERT, UPDATE, DELETE, or DDL
2. Always use parameterized queries with named parameters (@param)
3. Always include TOP clause to limit results
4. Use only tables and columns from the provided schema
5. If the query is unclear, respond with CLARIFICATION_NEEDED followed by a question
";

const RESPONSE_FORMAT: &str = "\
RESPONSE FORMAT:
If generating SQL: SQL|<sql_query>|PARAMS|<param1>=<value1>,<param2>=<value2>
If clarification needed: CLARIFICATION_NEEDED|<question>
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Role and rules.
    pub system: String,
    /// Schema, response format, question, history and session variables.
    pub user: String,
}

impl Prompt {
    /// System and user parts as one text.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.system, self.user)
    }
}

fn preamble(language: Language) -> &'static str {
    match language {
        Language::Hinglish => {
            "You are a SQL query generator that understands both English and Hinglish (Hindi-English mix). Generate ONLY SELECT statements."
        }
        Language::English => "You are a SQL query generator. Generate ONLY SELECT statements.",
    }
}

/// Build the prompt for `question`.
pub fn build_prompt(
    question: &str,
    schema: &Schema,
    context: &ConversationContext,
    language: Language,
) -> Prompt {
    let system = format!("{}\n{RULES}", preamble(language));

    // Writing to a String cannot fail.
    let mut user = String::from("DATABASE SCHEMA:\n");
    for table in &schema.tables {
        let _ = writeln!(user, "Table: {}", table.qualified_name());
        for column in &table.columns {
            let _ = writeln!(user, "  - {} ({})", column.name, column.data_type);
        }
        user.push('\n');
    }

    user.push_str(RESPONSE_FORMAT);
    let _ = write!(user, "\nQuery: {question}\n");

    let history = &context.messages[context.messages.len().saturating_sub(HISTORY_WINDOW)..];
    if !history.is_empty() {
        user.push_str("\nConversation Context:\n");
        for message in history {
            let _ = writeln!(user, "{}: {}", message.role, message.content);
        }
    }

    if !context.session_variables.is_empty() {
        user.push_str("\nSession Variables:\n");
        for (key, value) in &context.session_variables {
            let _ = writeln!(user, "{key}: {value}");
        }
    }

    Prompt { system, user }
}
