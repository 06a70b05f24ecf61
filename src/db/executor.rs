//! [`QueryExecutor`] over a shared SQLite connection.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql};
use serde_json::Value;

use crate::analysis::{AnalyticalQuery, QueryExecutor, QueryParam, Row};

impl ToSql for QueryParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            QueryParam::Text(s) => s.to_sql(),
            QueryParam::Integer(i) => i.to_sql(),
            QueryParam::Real(f) => f.to_sql(),
        }
    }
}

#[derive(Clone)]
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteExecutor {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self::new(Arc::new(Mutex::new(conn)))
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

/// SQLite column value → JSON. Blobs have no JSON form and become `null`.
fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

impl QueryExecutor for SqliteExecutor {
    fn execute(&self, query: &AnalyticalQuery) -> Result<Vec<Row>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("connection lock poisoned: {e}"))?;

        let mut stmt = conn
            .prepare(&query.sql)
            .context("failed to prepare analytical query")?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let params: Vec<(&str, &dyn ToSql)> = query
            .params
            .iter()
            .map(|(name, value)| (*name, value as &dyn ToSql))
            .collect();

        let rows = stmt
            .query_map(params.as_slice(), |row| {
                let mut record = Row::new();
                for (i, name) in columns.iter().enumerate() {
                    record.insert(name.clone(), to_json(row.get_ref(i)?));
                }
                Ok(record)
            })
            .context("failed to execute analytical query")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read query rows")?;

        tracing::debug!(rows = rows.len(), "sqlite query complete");
        Ok(rows)
    }
}
