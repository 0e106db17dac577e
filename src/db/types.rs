//! Bind parameters and row plumbing shared by every client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A loosely typed positional bind parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Param {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    Text(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Param {
    /// Returns true if this parameter is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Param::Null)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Null => write!(f, "NULL"),
            Param::Bool(b) => write!(f, "{b}"),
            Param::Int(i) => write!(f, "{i}"),
            Param::Float(v) => write!(f, "{v}"),
            Param::Text(s) => write!(f, "'{s}'"),
            Param::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

// Conversion implementations for common types
impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v as i64)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Param {
    fn from(v: Vec<u8>) -> Self {
        Param::Bytes(v)
    }
}

impl<T> From<Option<T>> for Param
where
    T: Into<Param>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Param::Null,
        }
    }
}

/// Receives one result set from a client.
///
/// `columns` is called exactly once, before any call to `row`.
pub trait RowSink: Send {
    /// Column names in driver order.
    fn columns(&mut self, names: &[String]);

    /// One fetched record; `None` is SQL NULL. The slice is reused between calls.
    fn row(&mut self, values: &[Option<String>]);
}

/// Per-result-set value buffer.
///
/// Sized once to the column count and overwritten for every fetched row.
#[derive(Debug, Default)]
pub struct RowBuffer {
    values: Vec<Option<String>>,
}

impl RowBuffer {
    /// Creates a buffer for `width` columns, all NULL.
    pub fn with_width(width: usize) -> Self {
        Self {
            values: vec![None; width],
        }
    }

    /// Number of columns this buffer holds.
    pub fn width(&self) -> usize {
        self.values.len()
    }

    /// Overwrites the value at `index`.
    pub fn set(&mut self, index: usize, value: Option<String>) {
        self.values[index] = value;
    }

    /// Current contents.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }
}
