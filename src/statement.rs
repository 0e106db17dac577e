//! Statement classification.
//!
//! Decides by leading keyword whether a statement is read through the
//! query path or executed through the mutation path. Matching is a
//! case-insensitive prefix test on the raw text; whitespace is not trimmed.

use std::fmt;

/// Prefix accepted by the array projection path.
const ARRAY_QUERY_PREFIX: &str = "SELECT";

/// Prefix accepted by the map projection path. Note the trailing space.
const MAP_QUERY_PREFIX: &str = "SELECT ";

/// Prefixes accepted by the mutation path.
const MUTATION_PREFIXES: [&str; 3] = ["UPDATE ", "INSERT ", "DELETE FROM "];

/// The operation class of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementClass {
    /// Expected to return rows.
    Query,
    /// Expected to return an affected-row count.
    Mutation,
    /// Did not match any recognized prefix.
    Unrecognized,
}

impl fmt::Display for StatementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "Query"),
            Self::Mutation => write!(f, "Mutation"),
            Self::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

/// Which projection path is asking. The two paths disagree on `SELECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    Array,
    Map,
}

/// Classifies a statement for the given projection path.
pub fn classify(sql: &str, shape: QueryShape) -> StatementClass {
    let query_prefix = match shape {
        QueryShape::Array => ARRAY_QUERY_PREFIX,
        QueryShape::Map => MAP_QUERY_PREFIX,
    };

    if has_prefix_ignore_case(sql, query_prefix) {
        StatementClass::Query
    } else if is_mutation(sql) {
        StatementClass::Mutation
    } else {
        StatementClass::Unrecognized
    }
}

/// Returns true if the array path should run this statement (bare `SELECT`).
pub fn is_array_query(sql: &str) -> bool {
    has_prefix_ignore_case(sql, ARRAY_QUERY_PREFIX)
}

/// Returns true if the map path should run this statement (`SELECT ` with a space).
pub fn is_map_query(sql: &str) -> bool {
    has_prefix_ignore_case(sql, MAP_QUERY_PREFIX)
}

/// Returns true for `UPDATE `, `INSERT ` and `DELETE FROM ` statements.
pub fn is_mutation(sql: &str) -> bool {
    MUTATION_PREFIXES
        .iter()
        .any(|prefix| has_prefix_ignore_case(sql, prefix))
}

fn has_prefix_ignore_case(sql: &str, prefix: &str) -> bool {
    sql.as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}
