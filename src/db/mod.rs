//! Database abstraction layer for sqlshape.
//!
//! Provides a trait-based interface for running statements, allowing
//! pools, transactions and test doubles to be used interchangeably.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::{PostgresClient, PostgresTransaction};
pub use sqlite::{SqliteClient, SqliteTransaction};
pub use types::{Param, RowBuffer, RowSink};

use crate::config::DatabaseConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a URL scheme.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Opens a pooled client for the configured database.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend()? {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Anything that can run a parameterized statement: a pool, a transaction, or a test double.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Runs a row-returning statement and streams its rows into `sink`.
    ///
    /// `sink.columns` is called even when no rows come back.
    async fn fetch_rows(&self, sql: &str, params: &[Param], sink: &mut dyn RowSink)
        -> Result<()>;

    /// Runs a statement and returns the driver-reported affected-row count.
    async fn execute(&self, sql: &str, params: &[Param]) -> Result<u64>;

    /// Releases the underlying connection(s).
    async fn close(&self) -> Result<()>;
}

/// A client bound to an open transaction.
#[async_trait]
pub trait TransactionClient: DatabaseClient {
    /// Commits the transaction.
    async fn commit(self) -> Result<()>
    where
        Self: Sized;

    /// Rolls the transaction back.
    async fn rollback(self) -> Result<()>
    where
        Self: Sized;
}
