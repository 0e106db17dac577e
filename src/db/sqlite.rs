//! SQLite database client implementation.
//!
//! Mirrors the PostgreSQL client for SQLite files and in-memory databases.
//! SQLite values are dynamically typed, so text projection follows each
//! value's storage class rather than the declared column type.

use crate::config::DatabaseConfig;
use crate::db::{DatabaseClient, Param, RowBuffer, RowSink, TransactionClient};
use crate::error::{Result, ShapeError};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection, SqlitePool,
    SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Executor, Row, Statement, Transaction, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// SQLite database client backed by a connection pool.
#[derive(Debug, Clone)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens a pool for the configured URL.
    ///
    /// In-memory databases get a single connection that is never recycled,
    /// since every new connection would see an empty database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.require_url()?;
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| ShapeError::config(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));
        pool_options = if url.contains(":memory:") || url.contains("mode=memory") {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| ShapeError::connection(format!("Failed to open {url}: {e}")))?;

        debug!("Connected to {}", config.display_string());
        Ok(Self { pool })
    }

    /// Opens a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&DatabaseConfig::from_url("sqlite::memory:")).await
    }

    /// Creates a new SqliteClient from an existing connection pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begins a transaction on a pooled connection.
    pub async fn begin(&self) -> Result<SqliteTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ShapeError::connection(format!("Failed to begin transaction: {e}")))?;
        Ok(SqliteTransaction { tx: Mutex::new(tx) })
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
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
            .map_err(|e| ShapeError::execution(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// An open SQLite transaction.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct SqliteTransaction {
    tx: Mutex<Transaction<'static, Sqlite>>,
}

#[async_trait]
impl DatabaseClient for SqliteTransaction {
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
            .map_err(|e| ShapeError::execution(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl TransactionClient for SqliteTransaction {
    async fn commit(self) -> Result<()> {
        self.tx
            .into_inner()
            .commit()
            .await
            .map_err(|e| ShapeError::execution(e.to_string()))
    }

    async fn rollback(self) -> Result<()> {
        self.tx
            .into_inner()
            .rollback()
            .await
            .map_err(|e| ShapeError::execution(e.to_string()))
    }
}

fn bind_params<'q>(sql: &'q str, params: &'q [Param]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
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

async fn fetch_on(
    conn: &mut SqliteConnection,
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
            .map_err(|e| ShapeError::execution(e.to_string()))?
        {
            let buffer = buffer.get_or_insert_with(|| {
                let names: Vec<String> = row
                    .columns()
                    .iter()
                    .map(|col| col.name().to_string())
                    .collect();
                sink.columns(&names);
                RowBuffer::with_width(names.len())
            });
            for index in 0..buffer.width() {
                buffer.set(index, value_as_text(&row, index)?);
            }
            sink.row(buffer.values());
        }
    }

    if buffer.is_none() {
        let statement = conn
            .prepare(sql)
            .await
            .map_err(|e| ShapeError::execution(e.to_string()))?;
        let names: Vec<String> = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();
        sink.columns(&names);
    }

    Ok(())
}

/// Reads a single value as text according to its storage class.
///
/// REAL values use Rust's shortest round-trip decimal form, never an
/// exponent: `1e20` reads as `100000000000000000000`.
fn value_as_text(row: &SqliteRow, index: usize) -> Result<Option<String>> {
    let storage_class = {
        let raw = row
            .try_get_raw(index)
            .map_err(|e| ShapeError::execution(e.to_string()))?;
        if raw.is_null() {
            return Ok(None);
        }
        raw.type_info().name().to_string()
    };

    let decoded = match storage_class.as_str() {
        "INTEGER" => row.try_get::<i64, _>(index).map(|i| i.to_string()),
        "REAL" => row.try_get::<f64, _>(index).map(|f| f.to_string()),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|b| String::from_utf8_lossy(&b).into_owned()),
        _ => row.try_get_unchecked::<String, _>(index),
    };

    decoded.map(Some).map_err(|e| {
        ShapeError::execution(format!(
            "Cannot read column '{}' as text: {e}",
            row.column(index).name()
        ))
    })
}
