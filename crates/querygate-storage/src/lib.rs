// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite backend for Querygate.
//!
//! Provides the schema catalog (live introspection with snapshot and on-disk
//! cache fallback), the structural pre-check, read-only query execution with
//! `TOP` to `LIMIT` adaptation, and switching between named connections.

pub mod cache;
pub mod connections;
pub mod database;
pub mod dialect;
pub mod introspect;
pub mod sqlite;

pub use cache::SchemaCache;
pub use connections::{ConnectionManager, DEFAULT_CONNECTION_LABEL};
pub use database::Database;
pub use sqlite::SqliteDatabase;
