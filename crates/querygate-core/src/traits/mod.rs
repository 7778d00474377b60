// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the Querygate pipeline.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility so the
//! orchestrator can hold them as `Arc<dyn ...>`.

pub mod database;
pub mod generator;

// Re-export all traits at the traits module level for convenience.
pub use database::{QueryExecutor, SchemaProvider};
pub use generator::SqlGenerator;
