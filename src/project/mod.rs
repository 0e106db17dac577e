//! Result projection.
//!
//! Runs a statement through a `DatabaseClient` and turns the result set into
//! string rows, string maps, or JSON text, or returns a mutation's
//! affected-row count.
//!
//! Every public function here runs behind a panic guard: a fault while
//! projecting is logged and returned as `ShapeError::Internal`, never
//! unwound into the caller.

mod array;
mod map;

pub use array::ArrayProjector;
pub use map::MapProjector;

use crate::casing::CasingMode;
use crate::db::{DatabaseClient, Param, RowSink, TransactionClient};
use crate::error::{Result, ShapeError};
use crate::statement::{self, QueryShape, StatementClass};
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, warn};

/// One row of an array result, positionally aligned with the header row.
pub type ArrayRow = Vec<String>;

/// One row of a map result, keyed by cased column name.
pub type MapRow = BTreeMap<String, String>;

/// Runs a query and returns a header row of cased column names followed by
/// one row of string values per record.
///
/// Statements that do not start with `SELECT` (any case) return an empty
/// vector without touching the database.
pub async fn query_to_array<C>(
    client: &C,
    casing: &CasingMode,
    sql: &str,
    params: &[Param],
) -> Result<Vec<ArrayRow>>
where
    C: DatabaseClient + ?Sized,
{
    guarded("query_to_array", async {
        if statement::classify(sql, QueryShape::Array) != StatementClass::Query {
            debug!(sql, "Statement is not a SELECT, returning no rows");
            return Ok(Vec::new());
        }

        let mut projector = ArrayProjector::new(casing);
        run_query(client, sql, params, &mut projector).await?;
        Ok(projector.into_rows())
    })
    .await
}

/// Runs a query and returns one `cased name -> value` map per record.
///
/// Only statements starting with `SELECT ` (with a trailing space, any case)
/// are run; anything else returns an empty vector.
pub async fn query_to_map<C>(
    client: &C,
    casing: &CasingMode,
    sql: &str,
    params: &[Param],
) -> Result<Vec<MapRow>>
where
    C: DatabaseClient + ?Sized,
{
    guarded("query_to_map", async {
        if statement::classify(sql, QueryShape::Map) != StatementClass::Query {
            debug!(sql, "Statement is not a SELECT, returning no rows");
            return Ok(Vec::new());
        }

        let mut projector = MapProjector::new(casing);
        run_query(client, sql, params, &mut projector).await?;
        Ok(projector.into_rows())
    })
    .await
}

/// [`query_to_array`] rendered as a JSON array of string arrays.
pub async fn query_to_array_json<C>(
    client: &C,
    casing: &CasingMode,
    sql: &str,
    params: &[Param],
) -> Result<String>
where
    C: DatabaseClient + ?Sized,
{
    let rows = query_to_array(client, casing, sql, params).await?;
    Ok(serde_json::to_string(&rows)?)
}

/// [`query_to_map`] rendered as a JSON array of objects.
pub async fn query_to_map_json<C>(
    client: &C,
    casing: &CasingMode,
    sql: &str,
    params: &[Param],
) -> Result<String>
where
    C: DatabaseClient + ?Sized,
{
    let rows = query_to_map(client, casing, sql, params).await?;
    Ok(serde_json::to_string(&rows)?)
}

/// Executes an `UPDATE `, `INSERT ` or `DELETE FROM ` statement and returns
/// the affected-row count.
///
/// Any other statement is rejected with `ShapeError::InvalidSql` before it
/// reaches the database.
///
/// The count is the driver's `rows_affected()`, an unsigned `u64`. It is
/// never negative, so callers expecting a signed 64-bit count can convert
/// with `i64::try_from`.
pub async fn execute_mutation<C>(client: &C, sql: &str, params: &[Param]) -> Result<u64>
where
    C: DatabaseClient + ?Sized,
{
    guarded("execute_mutation", run_mutation(client, sql, params)).await
}

/// [`execute_mutation`] inside an open transaction. Commit or roll back is
/// left to the caller.
pub async fn execute_mutation_in_transaction<T>(tx: &T, sql: &str, params: &[Param]) -> Result<u64>
where
    T: TransactionClient,
{
    guarded(
        "execute_mutation_in_transaction",
        run_mutation(tx, sql, params),
    )
    .await
}

async fn run_query<C>(
    client: &C,
    sql: &str,
    params: &[Param],
    sink: &mut dyn RowSink,
) -> Result<()>
where
    C: DatabaseClient + ?Sized,
{
    client
        .fetch_rows(sql, params, sink)
        .await
        .inspect_err(|e| warn!(sql, error = %e, "Error executing statement"))
}

async fn run_mutation<C>(client: &C, sql: &str, params: &[Param]) -> Result<u64>
where
    C: DatabaseClient + ?Sized,
{
    if !statement::is_mutation(sql) {
        return Err(ShapeError::invalid_sql(sql));
    }

    client
        .execute(sql, params)
        .await
        .inspect_err(|e| warn!(sql, error = %e, "Error executing statement"))
}

/// Runs `fut`, converting a panic into `ShapeError::Internal`.
async fn guarded<T, F>(operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(operation, "Recovered from panic: {message}");
            Err(ShapeError::internal(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
