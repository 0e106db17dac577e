//! PostgreSQL database client implementation.
//!
//! Provides `PostgresClient` (pooled) and `PostgresTransaction`, both
//! implementing `DatabaseClient` for PostgreSQL databases using sqlx.

use crate::config::DatabaseConfig;
use crate::db::{DatabaseClient, Param, RowBuffer, RowSink, TransactionClient};
use crate::error::{Result, ShapeError};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArguments, PgConnection, PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, Uuid};
use sqlx::{Column, Executor, Row, Statement, Transaction, TypeInfo, ValueRef};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// PostgreSQL database client backed by a connection pool.
#[derive(Debug, Clone)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Opens a pool for the configured URL.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.require_url()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Connected to {}", config.display_string());
        Ok(Self { pool })
    }

    /// Creates a new PostgresClient from an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begins a transaction on a pooled connection.
    pub async fn begin(&self) -> Result<PostgresTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ShapeError::connection(format!("Failed to begin transaction: {e}")))?;
        Ok(PostgresTransaction { tx: Mutex::new(tx) })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn fetch_rows(
        &self,
        sql: &str,
        params: &[Param],
        sink: &mut dyn RowSink,
    ) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ShapeError::connection(e.to_string()))?;
        fetch_on(&mut conn, sql, params, sink).await
    }

    async fn execute(&self, sql: &str, params: &[Param]) -> Result<u64> {
        let result = bind_params(sql, params)
            .execute(&self.pool)
            .await
            .map_err(|e| ShapeError::execution(format_query_error(e)))?;
        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// An open PostgreSQL transaction.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct PostgresTransaction {
    tx: Mutex<Transaction<'static, Postgres>>,
}

#[async_trait]
impl DatabaseClient for PostgresTransaction {
    async fn fetch_rows(
        &self,
        sql: &str,
        params: &[Param],
        sink: &mut dyn RowSink,
    ) -> Result<()> {
        let mut tx = self.tx.lock().await;
        fetch_on(&mut tx, sql, params, sink).await
    }

    async fn execute(&self, sql: &str, params: &[Param]) -> Result<u64> {
        let mut tx = self.tx.lock().await;
        let result = bind_params(sql, params)
            .execute(&mut **tx)
            .await
            .map_err(|e| ShapeError::execution(format_query_error(e)))?;
        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl TransactionClient for PostgresTransaction {
    async fn commit(self) -> Result<()> {
        self.tx
            .into_inner()
            .commit()
            .await
            .map_err(|e| ShapeError::execution(format_query_error(e)))
    }

    async fn rollback(self) -> Result<()> {
        self.tx
            .into_inner()
            .rollback()
            .await
            .map_err(|e| ShapeError::execution(format_query_error(e)))
    }
}

/// Binds params positionally onto a query.
fn bind_params<'q>(sql: &'q str, params: &'q [Param]) -> Query<'q, Postgres, PgArguments> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = match param {
            Param::Null => query.bind(None::<String>),
            Param::Bool(v) => query.bind(*v),
            Param::Int(v) => query.bind(*v),
            Param::Float(v) => query.bind(*v),
            Param::Text(v) => query.bind(v.as_str()),
            Param::Bytes(v) => query.bind(v.as_slice()),
        };
    }
    query
}

/// Streams a query's rows into `sink` through a single reused buffer.
async fn fetch_on(
    conn: &mut PgConnection,
    sql: &str,
    params: &[Param],
    sink: &mut dyn RowSink,
) -> Result<()> {
    let mut buffer: Option<RowBuffer> = None;

    {
        let mut rows = bind_params(sql, params).fetch(&mut *conn);
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| ShapeError::execution(format_query_error(e)))?
        {
            let buffer = buffer.get_or_insert_with(|| {
                let names = column_names(&row);
                sink.columns(&names);
                RowBuffer::with_width(names.len())
            });
            for index in 0..buffer.width() {
                buffer.set(index, value_as_text(&row, index)?);
            }
            sink.row(buffer.values());
        }
    }

    // No rows: ask the server for the column list instead
    if buffer.is_none() {
        let statement = conn
            .prepare(sql)
            .await
            .map_err(|e| ShapeError::execution(format_query_error(e)))?;
        let names: Vec<String> = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();
        sink.columns(&names);
    }

    Ok(())
}

fn column_names(row: &PgRow) -> Vec<String> {
    row.columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect()
}

/// Reads a single column value from a PgRow as text. SQL NULL is `None`.
///
/// Known types are decoded and formatted; anything else falls back to the
/// raw wire bytes.
fn value_as_text(row: &PgRow, index: usize) -> Result<Option<String>> {
    let column = row.column(index);
    let type_name = column.type_info().name();

    let decoded = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .map(|v| v.map(|b| b.to_string())),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .map(|v| v.map(|i| i.to_string())),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .map(|v| v.map(|i| i.to_string())),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .map(|v| v.map(|i| i.to_string())),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .map(|v| v.map(|f| f.to_string())),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .map(|v| v.map(|f| f.to_string())),

        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(index)
            .map(|v| v.map(|d| d.to_string())),

        "OID" => row
            .try_get::<Option<Oid>, _>(index)
            .map(|v| v.map(|oid| oid.0.to_string())),

        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map(|v| v.map(|d| d.to_string())),

        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .map(|v| v.map(|t| t.to_string())),

        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(|v| v.map(|ts| ts.to_string())),

        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map(|v| v.map(|ts| ts.to_rfc3339())),

        "UUID" => row
            .try_get::<Option<Uuid>, _>(index)
            .map(|v| v.map(|u| u.to_string())),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .map(|v| v.map(|b| String::from_utf8_lossy(&b).into_owned())),

        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .map(|v| v.map(|j| j.to_string())),

        // Text, enums and anything unrecognised
        _ => raw_as_text(row, index),
    };

    decoded.map_err(|e| {
        ShapeError::execution(format!(
            "Cannot read column '{}' of type {type_name} as text: {e}. Cast it with ::text",
            column.name()
        ))
    })
}

/// Reads a column's undecoded bytes as lossy UTF-8.
fn raw_as_text(row: &PgRow, index: usize) -> std::result::Result<Option<String>, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(None);
    }
    let bytes = raw.as_bytes().map_err(sqlx::Error::Decode)?;
    Ok(Some(String::from_utf8_lossy(bytes).into_owned()))
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &DatabaseConfig) -> ShapeError {
    let target = config.display_string();
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        ShapeError::connection(format!(
            "Cannot connect to {target}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        ShapeError::connection(format!(
            "Authentication failed for {target}. Check your credentials."
        ))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ShapeError::connection(format!(
            "Connection to {target} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ShapeError::connection(error.to_string())
    }
}

/// Formats a query error with hints if available.
fn format_query_error(error: sqlx::Error) -> String {
    // PostgreSQL errors often have format: "ERROR: message\nDETAIL: ...\nHINT: ..."
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }

        if let Some(constraint) = pg_error.constraint() {
            result.push_str("\n  CONSTRAINT: ");
            result.push_str(constraint);
        }
    }

    result
}
