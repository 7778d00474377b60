// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only database handle.
//!
//! The target database is opened with `SQLITE_OPEN_READ_ONLY` and
//! `PRAGMA query_only`, so nothing that reaches it can write even if it got
//! past validation. All statements run on tokio-rusqlite's background thread.

use std::time::Duration;

use querygate_core::QueryGateError;
use rusqlite::OpenFlags;
use tokio_rusqlite::Connection;
use tracing::debug;

/// Connection string for a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A single read-only connection to the target database.
pub struct Database {
    conn: Connection,
    target: String,
}

impl Database {
    /// Open `connection_string`: a file path, a `file:` URI, or `:memory:`.
    ///
    /// A missing file is an error; it is never created.
    pub async fn open(connection_string: &str) -> Result<Self, QueryGateError> {
        let target = connection_string
            .strip_prefix("sqlite://")
            .unwrap_or(connection_string)
            .to_string();

        let conn = if target == IN_MEMORY {
            Connection::open_in_memory().await
        } else {
            Connection::open_with_flags(
                &target,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .await
        }
        .map_err(QueryGateError::storage)?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA query_only = ON;")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %target, "database opened read-only");
        Ok(Self { conn, target })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The path or URI this handle was opened with.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Converts tokio-rusqlite errors into [`QueryGateError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error) -> QueryGateError {
    QueryGateError::storage(e)
}
