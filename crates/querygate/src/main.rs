// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Querygate - ask a database questions in English or Hinglish.
//!
//! This is the binary entry point.

mod app;
mod manage;
mod render;
mod shell;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use querygate_config::loader::user_config_path;
use querygate_config::{QueryGateConfig, SettingsStore, crypto};
use querygate_core::{ConversationContext, QueryGateError};

use crate::app::App;

/// Querygate - natural-language questions, read-only SQL answers.
#[derive(Parser, Debug)]
#[command(name = "querygate", version, about, long_about = None)]
struct Cli {
    /// Config file to load and save (defaults to ./querygate.toml when it
    /// exists, else the per-user config file).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask one question and print the result.
    Ask {
        /// The question, in English or Hinglish.
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Launch an interactive REPL session.
    Shell,
    /// Print the database schema.
    Schema {
        /// Re-read the live catalog instead of using the cache.
        #[arg(long)]
        refresh: bool,
    },
    /// Manage named database connections.
    #[command(subcommand)]
    Db(DbCommand),
    /// Read or change settings.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// List named connections.
    List,
    /// Make a named connection the active one.
    Switch { name: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print a setting, e.g. `bot.max_rows`.
    Get { key: String },
    /// Change and save a setting, e.g. `bot.provider gemini`.
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => querygate_config::load_and_validate_path(path),
        None => querygate_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            querygate_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let Some(command) = cli.command else {
        println!("querygate: use --help for available commands");
        return;
    };

    let save_path = cli.config.unwrap_or_else(default_save_path);
    if let Err(e) = run(command, config, &save_path).await {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn run(
    command: Commands,
    config: QueryGateConfig,
    save_path: &Path,
) -> Result<(), QueryGateError> {
    let settings = Arc::new(SettingsStore::new(
        config,
        save_path,
        crypto::default_key_path(),
    )?);

    match command {
        Commands::Ask { question } => {
            let app = App::new(settings);
            let result = app
                .ask(&question.join(" "), &ConversationContext::new())
                .await;
            shell::print_result(&result);
            if result.failure().is_some() {
                std::process::exit(2);
            }
        }
        Commands::Shell => shell::run_shell(App::new(settings)).await?,
        Commands::Schema { refresh } => {
            let schema = App::new(settings).schema(refresh).await?;
            print!("{}", render::render_schema(&schema));
        }
        Commands::Db(DbCommand::List) => manage::list_databases(settings),
        Commands::Db(DbCommand::Switch { name }) => {
            manage::switch_database(settings, &name).await?
        }
        Commands::Config(ConfigCommand::Get { key }) => {
            println!("{}", manage::get_setting(&settings, &key)?);
        }
        Commands::Config(ConfigCommand::Set { key, value }) => {
            manage::set_setting(&settings, &key, &value).await?;
            println!("{key} updated");
        }
    }
    Ok(())
}

/// `./querygate.toml` when present, else the per-user config file.
fn default_save_path() -> PathBuf {
    let local = PathBuf::from("querygate.toml");
    if local.exists() {
        return local;
    }
    user_config_path().unwrap_or(local)
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("querygate={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
