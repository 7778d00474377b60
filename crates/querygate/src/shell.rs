// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `querygate shell` command implementation.
//!
//! Launches an interactive REPL with a colored prompt and readline history.
//! Every question and answer is recorded in the session's conversation, so
//! follow-up questions can refer back to earlier ones.

use colored::Colorize;
use querygate_context::Conversation;
use querygate_core::{ExecutionResult, QueryGateError, QueryOutcome};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::app::App;
use crate::render::{render_schema, render_table, summarize};

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Clear,
    Schema,
    Help,
    Unknown(&'a str),
    Question(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => Input::Empty,
        ":quit" | ":exit" | ":q" => Input::Quit,
        ":clear" => Input::Clear,
        ":schema" => Input::Schema,
        ":help" => Input::Help,
        other if other.starts_with(':') => Input::Unknown(other),
        question => Input::Question(question),
    }
}

/// Runs the `querygate shell` interactive REPL.
pub async fn run_shell(app: App) -> Result<(), QueryGateError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| QueryGateError::Internal(format!("failed to initialize readline: {e}")))?;
    let mut conversation = Conversation::new();

    println!("{}", "querygate shell".bold().green());
    println!(
        "Ask a question in English or Hinglish. Type {} for commands, {} to exit.\n",
        ":help".yellow(),
        ":quit".yellow()
    );

    let prompt = format!("{}> ", "querygate".green());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Clear => {
                conversation.clear();
                println!("{}", "conversation cleared".dimmed());
            }
            Input::Schema => match app.schema(false).await {
                Ok(schema) => print!("{}", render_schema(&schema)),
                Err(e) => eprintln!("{}: {e}", "error".red()),
            },
            Input::Unknown(command) => {
                eprintln!("{}: unknown command {command}", "error".red());
            }
            Input::Question(question) => {
                let _ = rl.add_history_entry(question);
                let language = conversation.add_user_message(question);
                debug!(%language, "question received");

                let result = app.ask(question, conversation.context()).await;
                print_result(&result);
                conversation.add_system_response(summarize(&result));
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!("  {}   show the database schema", ":schema".yellow());
    println!("  {}    forget the conversation so far", ":clear".yellow());
    println!("  {}     leave the shell", ":quit".yellow());
}

/// Print a result: the table, a clarification question, or the failure.
pub fn print_result(result: &ExecutionResult) {
    match &result.outcome {
        QueryOutcome::Success(table) => {
            println!("{}", result.sql.dimmed());
            print!("{}", render_table(table));
            println!(
                "{}",
                format!("{} ms", result.elapsed.as_millis()).dimmed()
            );
        }
        QueryOutcome::Clarification { question } => {
            println!("{} {question}", "?".cyan().bold());
        }
        QueryOutcome::Failure(failure) => {
            eprintln!("{}: {}", "error".red(), failure.message);
            if !result.sql.is_empty() {
                eprintln!("{}", result.sql.dimmed());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_commands() {
        assert_eq!(parse_input(":quit"), Input::Quit);
        assert_eq!(parse_input(" :exit "), Input::Quit);
        assert_eq!(parse_input(":clear"), Input::Clear);
        assert_eq!(parse_input(":schema"), Input::Schema);
        assert_eq!(parse_input(":help"), Input::Help);
        assert_eq!(parse_input(":drop"), Input::Unknown(":drop"));
        assert_eq!(parse_input("   "), Input::Empty);
    }

    #[test]
    fn questions_are_trimmed() {
        assert_eq!(
            parse_input("  top 5 customers by revenue \n"),
            Input::Question("top 5 customers by revenue")
        );
    }
}
