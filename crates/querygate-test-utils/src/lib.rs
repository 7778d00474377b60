// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Querygate integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without model APIs or a database.
//!
//! # Components
//!
//! - [`MockGenerator`] - Scripted SQL generator with a call counter
//! - [`MockDatabase`] - Fixed schema, canned rows and an execution log
//! - [`TestHarness`] - Orchestrator wired over both mocks

pub mod harness;
pub mod mock_database;
pub mod mock_generator;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_database::{MockDatabase, customers_schema};
pub use mock_generator::MockGenerator;
