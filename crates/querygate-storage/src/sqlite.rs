// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`SchemaProvider`] and [`QueryExecutor`].

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use querygate_config::model::DatabaseConfig;
use querygate_core::types::{DEFAULT_MAX_ROWS, ResultColumn};
use querygate_core::{
    Parameters, QueryExecutor, QueryGateError, Schema, SchemaProvider, SqlValue, TabularResult,
};
use rusqlite::Statement;
use rusqlite::types::{Value, ValueRef};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::cache::SchemaCache;
use crate::database::{Database, map_tr_err};
use crate::dialect::to_sqlite;
use crate::introspect::introspect;

/// SQLite-backed schema catalog and executor.
///
/// The connection is opened lazily on first use; a failed open is retried on
/// the next call. Only a live introspection becomes the schema snapshot, which
/// is swapped atomically on refresh.
///
/// Execution never returns more than `row_cap` rows, whatever the statement
/// says.
pub struct SqliteDatabase {
    connection_string: String,
    db: OnceCell<Database>,
    snapshot: ArcSwapOption<Schema>,
    cache: SchemaCache,
    row_cap: u64,
}

impl SqliteDatabase {
    pub fn new(connection_string: impl Into<String>, cache: SchemaCache) -> Self {
        Self {
            connection_string: connection_string.into(),
            db: OnceCell::new(),
            snapshot: ArcSwapOption::empty(),
            cache,
            row_cap: DEFAULT_MAX_ROWS,
        }
    }

    /// Set the most rows a single execution may return.
    pub fn with_row_cap(mut self, row_cap: u64) -> Self {
        self.row_cap = row_cap.max(1);
        self
    }

    /// Target and cache location from the `[database]` section.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let cache_path = config
            .schema_cache_path
            .as_ref()
            .map(Into::into)
            .unwrap_or_else(SchemaCache::default_path);
        Self::new(config.connection_string.clone(), SchemaCache::new(cache_path))
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn db(&self) -> Result<&Database, QueryGateError> {
        self.db
            .get_or_try_init(|| Database::open(&self.connection_string))
            .await
    }

    /// Live introspection, no fallback.
    async fn introspect_live(&self) -> Result<Schema, QueryGateError> {
        self.db()
            .await?
            .connection()
            .call(|conn| introspect(conn))
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl SchemaProvider for SqliteDatabase {
    /// Snapshot, else live catalog, else persisted cache, else empty.
    async fn schema(&self) -> Result<Arc<Schema>, QueryGateError> {
        if let Some(schema) = self.snapshot.load_full() {
            return Ok(schema);
        }

        match self.refresh().await {
            Ok(schema) => Ok(schema),
            Err(e) => {
                warn!(error = %e, "schema introspection failed, trying cache");
                match self.cache.load().await {
                    Some(cached) => {
                        warn!(
                            path = %self.cache.path().display(),
                            tables = cached.tables.len(),
                            "using cached schema"
                        );
                        Ok(Arc::new(cached))
                    }
                    None => {
                        warn!("no schema cache available, continuing with an empty schema");
                        Ok(Arc::new(Schema::empty()))
                    }
                }
            }
        }
    }

    async fn refresh(&self) -> Result<Arc<Schema>, QueryGateError> {
        let schema = Arc::new(self.introspect_live().await?);
        info!(tables = schema.tables.len(), "schema introspection completed");
        if schema.is_empty() {
            debug!("introspection found no tables, keeping the schema cache");
        } else {
            self.cache.store(&schema).await;
        }
        self.snapshot.store(Some(Arc::clone(&schema)));
        Ok(schema)
    }

    /// Prepares without stepping. Valid when the statement is read-only and
    /// returns at least one column.
    async fn check_structure(&self, sql: &str) -> bool {
        let db = match self.db().await {
            Ok(db) => db,
            Err(e) => {
                warn!(error = %e, "structure check could not open the database");
                return false;
            }
        };

        let sql = to_sqlite(sql).into_owned();
        let verdict = db
            .connection()
            .call(move |conn| -> Result<bool, rusqlite::Error> {
                let stmt = conn.prepare(&sql)?;
                Ok(stmt.readonly() && stmt.column_count() > 0)
            })
            .await;

        match verdict {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "SQL structure validation failed");
                false
            }
        }
    }
}

#[async_trait]
impl QueryExecutor for SqliteDatabase {
    async fn execute(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<TabularResult, QueryGateError> {
        let db = self.db().await?;
        let sql = to_sqlite(sql).into_owned();
        let parameters = parameters.clone();
        let row_cap = self.row_cap;
        debug!(sql = %sql, row_cap, "executing query");

        let result = db
            .connection()
            .call(move |conn| -> Result<Result<TabularResult, QueryGateError>, rusqlite::Error> {
                let mut stmt = conn.prepare(&sql)?;
                if let Err(e) = bind_declared(&mut stmt, &parameters) {
                    return Ok(Err(e));
                }
                read_rows(stmt, row_cap).map(Ok)
            })
            .await
            .map_err(|e| QueryGateError::Execution {
                message: e.to_string(),
                source: Some(Box::new(e)),
            })??;

        info!(rows = result.row_count(), "query executed");
        Ok(result)
    }
}

/// Binds each parameter the statement declares. Keys may be written with or
/// without the `@`; extra keys are ignored.
fn bind_declared(stmt: &mut Statement<'_>, parameters: &Parameters) -> Result<(), QueryGateError> {
    for index in 1..=stmt.parameter_count() {
        let Some(name) = stmt.parameter_name(index).map(str::to_string) else {
            return Err(QueryGateError::Execution {
                message: format!("positional parameter ?{index} is not supported"),
                source: None,
            });
        };
        let bare = name.trim_start_matches(['@', ':', '$']);
        let value = parameters
            .get(bare)
            .or_else(|| parameters.get(&name))
            .ok_or_else(|| QueryGateError::Execution {
                message: format!("no value supplied for parameter {name}"),
                source: None,
            })?;
        stmt.raw_bind_parameter(index, to_sql_value(value))
            .map_err(|e| QueryGateError::Execution {
                message: format!("failed to bind {name}: {e}"),
                source: Some(Box::new(e)),
            })?;
    }
    Ok(())
}

fn to_sql_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Boolean(b) => Value::Integer(i64::from(*b)),
        SqlValue::Integer(i) => Value::Integer(*i),
        SqlValue::Real(r) => Value::Real(*r),
        SqlValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_value_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(r) => SqlValue::Real(r),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Text(format!("<{} bytes>", b.len())),
    }
}

fn type_name(value: ValueRef<'_>) -> Option<&'static str> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(_) => Some("INTEGER"),
        ValueRef::Real(_) => Some("REAL"),
        ValueRef::Text(_) => Some("TEXT"),
        ValueRef::Blob(_) => Some("BLOB"),
    }
}

/// Steps the bound statement until it is exhausted or `row_cap` rows are
/// read. Column types are taken from the first non-null value in each column.
fn read_rows(mut stmt: Statement<'_>, row_cap: u64) -> Result<TabularResult, rusqlite::Error> {
    let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
    let mut types: Vec<Option<&'static str>> = vec![None; names.len()];
    let mut rows = Vec::new();

    let mut cursor = stmt.raw_query();
    while let Some(row) = cursor.next()? {
        if rows.len() as u64 >= row_cap {
            warn!(row_cap, "result truncated at the row cap");
            break;
        }
        let mut values = Vec::with_capacity(names.len());
        for (i, ty) in types.iter_mut().enumerate() {
            let value = row.get_ref(i)?;
            if ty.is_none() {
                *ty = type_name(value);
            }
            values.push(from_value_ref(value));
        }
        rows.push(values);
    }

    let columns = names
        .into_iter()
        .zip(types)
        .map(|(name, ty)| ResultColumn {
            name,
            data_type: ty.map(str::to_string),
        })
        .collect();
    Ok(TabularResult { columns, rows })
}
