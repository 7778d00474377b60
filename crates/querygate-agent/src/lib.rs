// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query orchestration for Querygate.
//!
//! The [`QueryOrchestrator`] is the central coordinator that:
//! - Loads the schema snapshot
//! - Asks the configured generator for SQL (or a clarification question)
//! - Runs the validation pipeline and enforces the row cap
//! - Pre-checks the statement against the live database, then executes it
//!
//! The [`GeneratorFactory`] picks the backend named by `bot.provider` and
//! always wraps it in retries.

pub mod factory;
pub mod orchestrator;

pub use factory::{FixedGenerator, GeneratorFactory, GeneratorSource};
pub use orchestrator::{QueryOrchestrator, STRUCTURAL_ISSUES};
