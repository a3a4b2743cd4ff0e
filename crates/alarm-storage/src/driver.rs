// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `SqlDriver` abstraction and the row-shape normalization it exists to
//! hide.
//!
//! The platform storage handle (spec §6) exposes one primitive,
//! `sql.exec(query, ...binds)`, but the result can surface in any of three
//! shapes depending on the underlying driver: a batch of `{columns, rows}`
//! pairs, a single `{column_names, results}` struct, or an asynchronously
//! iterable cursor that has already yielded its rows. [`Store`](crate::store::Store)
//! must accept all three and normalize them into the same decoded sequence.
//! In production only [`crate::sqlite::RusqliteDriver`] is used, which always
//! returns [`SqlResult::RowBatches`]; the other two variants exist so the
//! normalization path has independently testable producers (see
//! `driver_tests.rs`).

/// A single bind value, passed positionally — never wrapped in an
/// array-typed bind. `SqlDriver::exec` takes `&[SqlValue]`, one entry per
/// `?` placeholder, by construction; there is no way to accidentally hand
/// the driver a single array bind instead of N scalar binds.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::Integer(v as i64)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// A single decoded row: column name paired with its value, in declared
/// column order.
#[derive(Debug, Clone, Default)]
pub struct Row(pub Vec<(String, SqlValue)>);

impl Row {
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.0.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column) {
            Some(SqlValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_text(&self, column: &str) -> Option<&str> {
        match self.get(column) {
            Some(SqlValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// One batch of rows sharing a column list, the shape a driver that streams
/// results in pages returns.
#[derive(Debug, Clone, Default)]
pub struct RowBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// The three result shapes `Store` must normalize identically.
#[derive(Debug, Clone)]
pub enum SqlResult {
    /// `Vec<{columns, rows}>` — the shape `RusqliteDriver` produces.
    RowBatches(Vec<RowBatch>),
    /// `{column_names, results}` — a single named-results struct.
    NamedResults { column_names: Vec<String>, results: Vec<Vec<SqlValue>> },
    /// Rows already pulled off an asynchronously iterable cursor.
    Cursor(Vec<Row>),
}

impl SqlResult {
    /// Normalize any of the three driver shapes into a flat, column-keyed
    /// row sequence. This is the one place the driver's shape quirk is
    /// allowed to leak into; everything above `Store` sees only `Vec<Row>`.
    pub fn normalize(self) -> Vec<Row> {
        match self {
            SqlResult::RowBatches(batches) => batches
                .into_iter()
                .flat_map(|batch| {
                    let columns = batch.columns;
                    batch.rows.into_iter().map(move |values| {
                        Row(columns.iter().cloned().zip(values).collect())
                    })
                })
                .collect(),
            SqlResult::NamedResults { column_names, results } => results
                .into_iter()
                .map(|values| Row(column_names.iter().cloned().zip(values).collect()))
                .collect(),
            SqlResult::Cursor(rows) => rows,
        }
    }
}

/// Platform storage handle: `sql.exec(query, ...binds)` (spec §6).
///
/// Implementations run synchronously; `Store` is responsible for moving
/// calls off the async executor (`spawn_blocking`), since every PL operation
/// may suspend (spec §5).
pub trait SqlDriver: Send + Sync + 'static {
    fn exec(&self, query: &str, binds: &[SqlValue]) -> Result<SqlResult, DriverError>;
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DriverError(pub String);

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
