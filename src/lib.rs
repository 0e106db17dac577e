//! sqlshape - run SQL and get back plain strings.
//!
//! Projects result sets into header-plus-rows string arrays, column-keyed
//! string maps, or the JSON text of either, and runs write statements for
//! their affected-row count. Every value is treated as text and SQL NULL
//! becomes the empty string.
//!
//! ```no_run
//! use sqlshape::{query_to_map_json, CasingMode, SqliteClient};
//!
//! # async fn demo() -> sqlshape::Result<()> {
//! let db = SqliteClient::in_memory().await?;
//! let json = query_to_map_json(&db, &CasingMode::Camel, "SELECT 1 AS user_id", &[]).await?;
//! assert_eq!(json, r#"[{"userId":"1"}]"#);
//! # Ok(())
//! # }
//! ```

pub mod casing;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod project;
pub mod statement;

pub use casing::CasingMode;
pub use db::{
    DatabaseClient, Param, PostgresClient, PostgresTransaction, SqliteClient, SqliteTransaction,
    TransactionClient,
};
pub use error::{Result, ShapeError};
pub use project::{
    execute_mutation, execute_mutation_in_transaction, query_to_array, query_to_array_json,
    query_to_map, query_to_map_json, ArrayRow, MapRow,
};
