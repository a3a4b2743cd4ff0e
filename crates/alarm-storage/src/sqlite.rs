// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The production `SqlDriver`, backed by bundled SQLite.

use parking_lot::Mutex;
use rusqlite::{types::ValueRef, Connection};

use crate::driver::{DriverError, RowBatch, SqlDriver, SqlResult, SqlValue};

/// Wraps a single `rusqlite::Connection` behind a mutex. SQLite serializes
/// writers regardless; `Store` already moves every call through
/// `spawn_blocking`, so a plain mutex (no async lock) is the right tool here.
pub struct RusqliteDriver {
    conn: Mutex<Connection>,
}

impl RusqliteDriver {
    pub fn open(path: &str) -> Result<Self, DriverError> {
        let conn = Connection::open(path).map_err(|e| DriverError(e.to_string()))?;
        conn.pragma_update(None, "journal_mode", "WAL").map_err(|e| DriverError(e.to_string()))?;
        conn.pragma_update(None, "foreign_keys", true).map_err(|e| DriverError(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, DriverError> {
        let conn = Connection::open_in_memory().map_err(|e| DriverError(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

fn to_sql_value(v: ValueRef<'_>) -> SqlValue {
    match v {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(f) => SqlValue::Integer(f as i64),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
    }
}

fn to_rusqlite_value(v: &SqlValue) -> rusqlite::types::Value {
    match v {
        SqlValue::Null => rusqlite::types::Value::Null,
        SqlValue::Integer(i) => rusqlite::types::Value::Integer(*i),
        SqlValue::Text(s) => rusqlite::types::Value::Text(s.clone()),
        SqlValue::Blob(b) => rusqlite::types::Value::Blob(b.clone()),
    }
}

impl SqlDriver for RusqliteDriver {
    fn exec(&self, query: &str, binds: &[SqlValue]) -> Result<SqlResult, DriverError> {
        let conn = self.conn.lock();
        let params: Vec<rusqlite::types::Value> = binds.iter().map(to_rusqlite_value).collect();
        let mut stmt = conn.prepare(query).map_err(|e| DriverError(e.to_string()))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        if columns.is_empty() {
            stmt.execute(rusqlite::params_from_iter(params.iter())).map_err(|e| DriverError(e.to_string()))?;
            return Ok(SqlResult::RowBatches(vec![]));
        }

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(|e| DriverError(e.to_string()))?;
        let mut batch_rows = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DriverError(e.to_string()))? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let value_ref = row.get_ref(i).map_err(|e| DriverError(e.to_string()))?;
                values.push(to_sql_value(value_ref));
            }
            batch_rows.push(values);
        }
        Ok(SqlResult::RowBatches(vec![RowBatch { columns, rows: batch_rows }]))
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
