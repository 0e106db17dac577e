//! Array-of-arrays projection.

use super::ArrayRow;
use crate::casing::CasingMode;
use crate::db::RowSink;

/// Collects a result set as a header row of cased column names followed by
/// one string row per record. NULL becomes the empty string.
#[derive(Debug)]
pub struct ArrayProjector<'a> {
    casing: &'a CasingMode,
    rows: Vec<ArrayRow>,
}

impl<'a> ArrayProjector<'a> {
    pub fn new(casing: &'a CasingMode) -> Self {
        Self {
            casing,
            rows: Vec::new(),
        }
    }

    /// Header first, then data rows in fetch order.
    pub fn into_rows(self) -> Vec<ArrayRow> {
        self.rows
    }
}

impl RowSink for ArrayProjector<'_> {
    fn columns(&mut self, names: &[String]) {
        self.rows.push(self.casing.apply_all(names));
    }

    fn row(&mut self, values: &[Option<String>]) {
        self.rows.push(
            values
                .iter()
                .map(|v| v.as_deref().unwrap_or_default().to_string())
                .collect(),
        );
    }
}
