//! Mock database clients for testing.
//!
//! Provides in-memory clients that return canned results and record what
//! they were asked to run.

use super::{DatabaseClient, Param, RowBuffer, RowSink};
use crate::error::{Result, ShapeError};
use async_trait::async_trait;
use std::sync::Mutex;

/// A mock database client that returns predefined results.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    rows_affected: u64,
    calls: Mutex<Vec<(String, Vec<Param>)>>,
}

impl MockDatabaseClient {
    /// Creates a mock with no columns, no rows and zero affected rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that answers every query with the given result set.
    ///
    /// Each canned row is fitted to the column count: missing values become
    /// NULL and extra values are dropped.
    pub fn with_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Option<&str>>>,
    ) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut row: Vec<Option<String>> =
                    row.into_iter().map(|v| v.map(String::from)).collect();
                row.resize(width, None);
                row
            })
            .collect();

        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    /// Sets the affected-row count reported by `execute`.
    pub fn with_rows_affected(mut self, count: u64) -> Self {
        self.rows_affected = count;
        self
    }

    /// Returns every (statement, params) pair this client has received.
    pub fn calls(&self) -> Vec<(String, Vec<Param>)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, sql: &str, params: &[Param]) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((sql.to_string(), params.to_vec()));
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn fetch_rows(
        &self,
        sql: &str,
        params: &[Param],
        sink: &mut dyn RowSink,
    ) -> Result<()> {
        self.record(sql, params);
        sink.columns(&self.columns);

        let mut buffer = RowBuffer::with_width(self.columns.len());
        for row in &self.rows {
            for (i, value) in row.iter().enumerate() {
                buffer.set(i, value.clone());
            }
            sink.row(buffer.values());
        }
        Ok(())
    }

    async fn execute(&self, sql: &str, params: &[Param]) -> Result<u64> {
        self.record(sql, params);
        Ok(self.rows_affected)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A client whose every call fails with an execution error.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a failing client that reports `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingDatabaseClient {
    fn default() -> Self {
        Self::new("connection reset by peer")
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn fetch_rows(
        &self,
        _sql: &str,
        _params: &[Param],
        _sink: &mut dyn RowSink,
    ) -> Result<()> {
        Err(ShapeError::execution(self.message.clone()))
    }

    async fn execute(&self, _sql: &str, _params: &[Param]) -> Result<u64> {
        Err(ShapeError::execution(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
