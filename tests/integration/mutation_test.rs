//! Mutation execution integration tests.
//!
//! Covers statement classification, affected-row counts and transactions
//! against SQLite.

use sqlshape::{
    execute_mutation, execute_mutation_in_transaction, query_to_array, CasingMode,
    DatabaseClient, Param, ShapeError, SqliteClient, TransactionClient,
};

async fn seeded_client() -> SqliteClient {
    let client = SqliteClient::in_memory().await.unwrap();
    client
        .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", &[])
        .await
        .unwrap();
    client
}

async fn count_rows(client: &SqliteClient) -> String {
    let rows = query_to_array(client, &CasingMode::Lower, "SELECT count(*) AS n FROM t", &[])
        .await
        .unwrap();
    rows[1][0].clone()
}

#[tokio::test]
async fn test_insert_update_delete_counts() {
    let client = seeded_client().await;

    let inserted = execute_mutation(
        &client,
        "INSERT INTO t (id, name) VALUES (?, ?), (?, ?)",
        &[
            Param::Int(1),
            Param::from("a"),
            Param::Int(2),
            Param::Null,
        ],
    )
    .await
    .unwrap();
    assert_eq!(inserted, 2);

    let updated = execute_mutation(
        &client,
        "update t set name = ? where name is null",
        &[Param::from("b")],
    )
    .await
    .unwrap();
    assert_eq!(updated, 1);

    let deleted = execute_mutation(&client, "DELETE FROM t WHERE id = ?", &[Param::Int(1)])
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    assert_eq!(count_rows(&client).await, "1");
}

#[tokio::test]
async fn test_unrecognized_mutation_is_rejected_before_execution() {
    let client = seeded_client().await;

    let err = execute_mutation(&client, "DROP TABLE t", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ShapeError::InvalidSql(_)));
    assert_eq!(err.to_string(), "Invalid SQL: DROP TABLE t");

    // The table must still exist
    assert_eq!(count_rows(&client).await, "0");
}

#[tokio::test]
async fn test_delete_requires_from() {
    let client = seeded_client().await;

    let err = execute_mutation(&client, "DELETE t", &[]).await.unwrap_err();
    assert!(matches!(err, ShapeError::InvalidSql(_)));
}

#[tokio::test]
async fn test_constraint_violation_is_execution_error() {
    let client = seeded_client().await;
    execute_mutation(&client, "INSERT INTO t (id) VALUES (1)", &[])
        .await
        .unwrap();

    let err = execute_mutation(&client, "INSERT INTO t (id) VALUES (1)", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ShapeError::Execution(_)));
}

#[tokio::test]
async fn test_transaction_commit() {
    let client = seeded_client().await;

    let tx = client.begin().await.unwrap();
    let inserted = execute_mutation_in_transaction(
        &tx,
        "INSERT INTO t (id, name) VALUES (?, ?)",
        &[Param::Int(10), Param::from("x")],
    )
    .await
    .unwrap();
    assert_eq!(inserted, 1);

    let seen = query_to_array(&tx, &CasingMode::Lower, "SELECT name FROM t WHERE id = 10", &[])
        .await
        .unwrap();
    assert_eq!(seen[1], vec!["x"]);

    tx.commit().await.unwrap();
    assert_eq!(count_rows(&client).await, "1");
}

#[tokio::test]
async fn test_transaction_rollback() {
    let client = seeded_client().await;

    let tx = client.begin().await.unwrap();
    execute_mutation_in_transaction(&tx, "INSERT INTO t (id) VALUES (1)", &[])
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(count_rows(&client).await, "0");
}

#[tokio::test]
async fn test_transaction_rejects_unrecognized_statement() {
    let client = seeded_client().await;

    let tx = client.begin().await.unwrap();
    let err = execute_mutation_in_transaction(&tx, "TRUNCATE t", &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("TRUNCATE t"));
    tx.rollback().await.unwrap();
}
