// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock database implementing both `SchemaProvider` and `QueryExecutor`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use querygate_core::types::{Column, ResultColumn, Table};
use querygate_core::{
    Parameters, QueryExecutor, QueryGateError, Schema, SchemaProvider, SqlValue, TabularResult,
};

/// Fixed schema, canned rows, a configurable structural verdict, and a log
/// of every statement checked or executed.
pub struct MockDatabase {
    schema: Arc<Schema>,
    rows: TabularResult,
    structure_ok: AtomicBool,
    execution_error: Mutex<Option<String>>,
    checked: Mutex<Vec<String>>,
    executed: Mutex<Vec<(String, Parameters)>>,
}

impl MockDatabase {
    pub fn new(schema: Schema, rows: TabularResult) -> Self {
        Self {
            schema: Arc::new(schema),
            rows,
            structure_ok: AtomicBool::new(true),
            execution_error: Mutex::new(None),
            checked: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// A `Customers(Id, Name, City)` table with two rows.
    pub fn customers() -> Self {
        Self::new(customers_schema(), customers_rows())
    }

    /// Set the verdict returned by `check_structure`.
    pub fn set_structure_ok(&self, ok: bool) {
        self.structure_ok.store(ok, Ordering::SeqCst);
    }

    /// Make every following `execute` fail with `message`.
    pub async fn fail_execution(&self, message: &str) {
        *self.execution_error.lock().await = Some(message.to_string());
    }

    /// Statements passed to `check_structure`.
    pub async fn checked(&self) -> Vec<String> {
        self.checked.lock().await.clone()
    }

    /// Statements and parameters passed to `execute`.
    pub async fn executed(&self) -> Vec<(String, Parameters)> {
        self.executed.lock().await.clone()
    }
}

#[async_trait]
impl SchemaProvider for MockDatabase {
    async fn schema(&self) -> Result<Arc<Schema>, QueryGateError> {
        Ok(Arc::clone(&self.schema))
    }

    async fn refresh(&self) -> Result<Arc<Schema>, QueryGateError> {
        Ok(Arc::clone(&self.schema))
    }

    async fn check_structure(&self, sql: &str) -> bool {
        self.checked.lock().await.push(sql.to_string());
        self.structure_ok.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for MockDatabase {
    async fn execute(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<TabularResult, QueryGateError> {
        self.executed
            .lock()
            .await
            .push((sql.to_string(), parameters.clone()));

        if let Some(message) = self.execution_error.lock().await.clone() {
            return Err(QueryGateError::Execution {
                message,
                source: None,
            });
        }
        Ok(self.rows.clone())
    }
}

/// Schema with a single `dbo.Customers` table.
pub fn customers_schema() -> Schema {
    let column = |name: &str, data_type: &str, nullable: bool| Column {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable,
        identity: name == "Id",
    };
    Schema {
        tables: vec![Table {
            name: "Customers".to_string(),
            schema: "dbo".to_string(),
            columns: vec![
                column("Id", "INTEGER", false),
                column("Name", "TEXT", false),
                column("City", "TEXT", true),
            ],
            primary_keys: vec!["Id".to_string()],
        }],
        relationships: Vec::new(),
        last_updated: None,
    }
}

fn customers_rows() -> TabularResult {
    let column = |name: &str, data_type: &str| ResultColumn {
        name: name.to_string(),
        data_type: Some(data_type.to_string()),
    };
    TabularResult {
        columns: vec![
            column("Id", "INTEGER"),
            column("Name", "TEXT"),
            column("City", "TEXT"),
        ],
        rows: vec![
            vec![
                SqlValue::Integer(1),
                SqlValue::Text("Asha".into()),
                SqlValue::Text("Delhi".into()),
            ],
            vec![
                SqlValue::Integer(2),
                SqlValue::Text("Ravi".into()),
                SqlValue::Null,
            ],
        ],
    }
}
