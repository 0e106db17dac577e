//! Query projection integration tests.
//!
//! Runs the array, map and JSON projections end to end against SQLite.

use pretty_assertions::assert_eq;
use sqlshape::{
    query_to_array, query_to_array_json, query_to_map, query_to_map_json, ArrayRow, CasingMode,
    DatabaseClient, MapRow, Param, ShapeError, SqliteClient,
};

/// Creates an in-memory database holding `t(id, user_name)` with rows (1, 'a') and (2, NULL).
async fn seeded_client() -> SqliteClient {
    let client = SqliteClient::in_memory().await.unwrap();
    client
        .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, user_name TEXT)", &[])
        .await
        .unwrap();
    client
        .execute(
            "INSERT INTO t (id, user_name) VALUES (1, 'a'), (2, NULL)",
            &[],
        )
        .await
        .unwrap();
    client
}

fn map_row(pairs: &[(&str, &str)]) -> MapRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_array_camel_scenario() {
    let client = seeded_client().await;

    let rows = query_to_array(
        &client,
        &CasingMode::Camel,
        "SELECT id, user_name FROM t ORDER BY id",
        &[],
    )
    .await
    .unwrap();

    assert_eq!(
        rows,
        vec![
            vec!["id".to_string(), "userName".to_string()],
            vec!["1".to_string(), "a".to_string()],
            vec!["2".to_string(), String::new()],
        ]
    );
}

#[tokio::test]
async fn test_map_camel_scenario() {
    let client = seeded_client().await;

    let rows = query_to_map(
        &client,
        &CasingMode::Camel,
        "SELECT id, user_name FROM t ORDER BY id",
        &[],
    )
    .await
    .unwrap();

    assert_eq!(
        rows,
        vec![
            map_row(&[("id", "1"), ("userName", "a")]),
            map_row(&[("id", "2"), ("userName", "")]),
        ]
    );
}

#[tokio::test]
async fn test_upper_and_lower_headers() {
    let client = seeded_client().await;

    let upper = query_to_array(&client, &CasingMode::Upper, "SELECT id, user_name FROM t", &[])
        .await
        .unwrap();
    assert_eq!(upper[0], vec!["ID", "USER_NAME"]);

    let lower = query_to_array(
        &client,
        &CasingMode::Lower,
        "SELECT id AS ID, user_name AS User_Name FROM t",
        &[],
    )
    .await
    .unwrap();
    assert_eq!(lower[0], vec!["id", "user_name"]);
}

#[tokio::test]
async fn test_empty_result_has_header_only() {
    let client = seeded_client().await;

    let rows = query_to_array(
        &client,
        &CasingMode::Camel,
        "SELECT id, user_name FROM t WHERE id > ?",
        &[Param::Int(100)],
    )
    .await
    .unwrap();
    assert_eq!(rows, vec![vec!["id".to_string(), "userName".to_string()]]);

    let maps = query_to_map(
        &client,
        &CasingMode::Camel,
        "SELECT id, user_name FROM t WHERE id > ?",
        &[Param::Int(100)],
    )
    .await
    .unwrap();
    assert!(maps.is_empty());
}

#[tokio::test]
async fn test_bound_params_filter_rows() {
    let client = seeded_client().await;

    let rows = query_to_map(
        &client,
        &CasingMode::Lower,
        "SELECT id, user_name FROM t WHERE user_name = ?",
        &[Param::from("a")],
    )
    .await
    .unwrap();

    assert_eq!(rows, vec![map_row(&[("id", "1"), ("user_name", "a")])]);
}

#[tokio::test]
async fn test_non_select_query_returns_nothing_and_runs_nothing() {
    let client = seeded_client().await;

    let rows = query_to_array(&client, &CasingMode::Lower, "DELETE FROM t", &[])
        .await
        .unwrap();
    assert!(rows.is_empty());

    let remaining = query_to_array(&client, &CasingMode::Lower, "SELECT count(*) AS n FROM t", &[])
        .await
        .unwrap();
    assert_eq!(remaining[1], vec!["2"]);
}

#[tokio::test]
async fn test_map_path_requires_space_after_select() {
    let client = seeded_client().await;

    let maps = query_to_map(&client, &CasingMode::Lower, "SELECT\tid FROM t", &[])
        .await
        .unwrap();
    assert!(maps.is_empty());

    let arrays = query_to_array(&client, &CasingMode::Lower, "SELECT\tid FROM t", &[])
        .await
        .unwrap();
    assert_eq!(arrays.len(), 3);
}

#[tokio::test]
async fn test_unrecognized_casing() {
    let client = seeded_client().await;
    let casing = CasingMode::parse("snake");

    let arrays = query_to_array(&client, &casing, "SELECT id, user_name FROM t ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(arrays[0], vec!["", ""]);
    assert_eq!(arrays.len(), 3);

    let maps = query_to_map(&client, &casing, "SELECT id, user_name FROM t ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(maps, vec![map_row(&[("", "a")]), map_row(&[("", "")])]);
}

#[tokio::test]
async fn test_array_json_roundtrip() {
    let client = seeded_client().await;
    let sql = "SELECT id, user_name FROM t ORDER BY id";

    let direct = query_to_array(&client, &CasingMode::Camel, sql, &[])
        .await
        .unwrap();
    let json = query_to_array_json(&client, &CasingMode::Camel, sql, &[])
        .await
        .unwrap();

    let parsed: Vec<ArrayRow> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, direct);
}

#[tokio::test]
async fn test_map_json_text() {
    let client = seeded_client().await;

    let json = query_to_map_json(
        &client,
        &CasingMode::Upper,
        "SELECT id, user_name FROM t ORDER BY id",
        &[],
    )
    .await
    .unwrap();

    assert_eq!(
        json,
        r#"[{"ID":"1","USER_NAME":"a"},{"ID":"2","USER_NAME":""}]"#
    );
}

#[tokio::test]
async fn test_sql_error_is_reported() {
    let client = seeded_client().await;

    let err = query_to_array(&client, &CasingMode::Lower, "SELECT * FROM missing_table", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ShapeError::Execution(_)));
    assert!(err.to_string().contains("missing_table"));

    let err = query_to_map_json(&client, &CasingMode::Lower, "SELECT * FROM missing_table", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ShapeError::Execution(_)));
}

#[tokio::test]
async fn test_mixed_value_types_become_text() {
    let client = SqliteClient::in_memory().await.unwrap();

    let rows = query_to_map(
        &client,
        &CasingMode::Lower,
        "SELECT 42 AS i, 0.5 AS r, 'txt' AS s, X'414243' AS b, NULL AS n",
        &[],
    )
    .await
    .unwrap();

    assert_eq!(
        rows,
        vec![map_row(&[
            ("b", "ABC"),
            ("i", "42"),
            ("n", ""),
            ("r", "0.5"),
            ("s", "txt"),
        ])]
    );
}
