//! Provider trait and the in-memory implementation.

use std::collections::BTreeMap;

use thiserror::Error;

use meshpilot_core_types::row::fields;
use meshpilot_core_types::{FlowError, ScenarioRow};

#[derive(Debug, Error, Clone)]
pub enum DataError {
    /// The requested scenario key does not exist in this provider.
    #[error("no scenario row for key '{key}'; available keys: {available:?}")]
    UnknownKey { key: String, available: Vec<String> },

    /// The row exists but a mandatory field is blank.
    #[error("scenario '{sno}' has a blank mandatory field '{field}'")]
    BlankField { sno: String, field: String },

    /// The backing source could not be read or parsed.
    #[error("scenario source error: {0}")]
    Source(String),
}

impl From<DataError> for FlowError {
    fn from(err: DataError) -> Self {
        FlowError::Data(err.to_string())
    }
}

/// Lookup seam every workflow driver consumes.
pub trait RowProvider: Send + Sync {
    /// The row for `sno`, validated for mandatory fields.
    fn get_row(&self, sno: &str) -> Result<ScenarioRow, DataError>;

    /// All keys this provider can serve, in stable order.
    fn available_keys(&self) -> Vec<String>;
}

/// Rows held in memory; also the backing store for the CSV provider.
#[derive(Clone, Debug, Default)]
pub struct MemoryProvider {
    rows: BTreeMap<String, ScenarioRow>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = ScenarioRow>) -> Self {
        let mut provider = Self::new();
        for row in rows {
            provider.insert(row);
        }
        provider
    }

    pub fn insert(&mut self, row: ScenarioRow) {
        self.rows.insert(row.sno.clone(), row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowProvider for MemoryProvider {
    fn get_row(&self, sno: &str) -> Result<ScenarioRow, DataError> {
        let row = self
            .rows
            .get(sno)
            .cloned()
            .ok_or_else(|| DataError::UnknownKey {
                key: sno.to_string(),
                available: self.available_keys(),
            })?;
        if row.query().is_none() {
            return Err(DataError::BlankField {
                sno: sno.to_string(),
                field: fields::QUERY.to_string(),
            });
        }
        Ok(row)
    }

    fn available_keys(&self) -> Vec<String> {
        self.rows.keys().cloned().collect()
    }
}
