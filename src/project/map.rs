//! Array-of-maps projection.

use super::MapRow;
use crate::casing::CasingMode;
use crate::db::RowSink;

/// Collects a result set as one `cased name -> value` map per record.
///
/// Keys are zipped positionally with the row, so columns whose cased names
/// collide overwrite each other and the rightmost column wins. With an
/// unrecognized casing mode every key is `""`.
#[derive(Debug)]
pub struct MapProjector<'a> {
    casing: &'a CasingMode,
    keys: Vec<String>,
    rows: Vec<MapRow>,
}

impl<'a> MapProjector<'a> {
    pub fn new(casing: &'a CasingMode) -> Self {
        Self {
            casing,
            keys: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn into_rows(self) -> Vec<MapRow> {
        self.rows
    }
}

impl RowSink for MapProjector<'_> {
    fn columns(&mut self, names: &[String]) {
        self.keys = self.casing.apply_all(names);
    }

    fn row(&mut self, values: &[Option<String>]) {
        let row: MapRow = self
            .keys
            .iter()
            .zip(values)
            .map(|(key, value)| (key.clone(), value.clone().unwrap_or_default()))
            .collect();
        self.rows.push(row);
    }
}
