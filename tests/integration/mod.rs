//! Integration tests for sqlshape.

pub mod mutation_test;
pub mod query_test;
