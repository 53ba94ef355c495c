//! CSV-backed scenario rows.
//!
//! Expects a header row containing an `sno` column; every other column
//! becomes a named field on the row.

use std::path::Path;

use tracing::debug;

use meshpilot_core_types::ScenarioRow;

use crate::provider::{DataError, MemoryProvider, RowProvider};

const KEY_COLUMN: &str = "sno";

#[derive(Debug)]
pub struct CsvProvider {
    inner: MemoryProvider,
}

impl CsvProvider {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|err| DataError::Source(format!("{}: {err}", path.display())))?;

        let headers = reader
            .headers()
            .map_err(|err| DataError::Source(err.to_string()))?
            .clone();
        let key_index = headers
            .iter()
            .position(|h| h.trim() == KEY_COLUMN)
            .ok_or_else(|| {
                DataError::Source(format!(
                    "{}: no '{KEY_COLUMN}' column in header {headers:?}",
                    path.display()
                ))
            })?;

        let mut inner = MemoryProvider::new();
        for record in reader.records() {
            let record = record.map_err(|err| DataError::Source(err.to_string()))?;
            let sno = record
                .get(key_index)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    DataError::Source(format!("{}: record with blank '{KEY_COLUMN}'", path.display()))
                })?;
            let mut row = ScenarioRow::new(sno);
            for (index, header) in headers.iter().enumerate() {
                if index == key_index {
                    continue;
                }
                if let Some(value) = record.get(index) {
                    row.insert(header.trim(), value);
                }
            }
            inner.insert(row);
        }
        debug!(path = %path.display(), rows = inner.len(), "loaded scenario rows");
        Ok(Self { inner })
    }
}

impl RowProvider for CsvProvider {
    fn get_row(&self, sno: &str) -> Result<ScenarioRow, DataError> {
        self.inner.get_row(sno)
    }

    fn available_keys(&self) -> Vec<String> {
        self.inner.available_keys()
    }
}
