//! Scenario input rows.
//!
//! A row is an immutable mapping of named fields keyed by a scenario
//! identifier ("sno"). Sourcing (CSV, fixture) lives in the data-provider
//! crate; the workflows only read through this type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::FlowError;

/// Well-known field names used across the workflows.
pub mod fields {
    pub const QUERY: &str = "query";
    pub const OFFBOARD_REASON: &str = "offboardReason";
    pub const SUPPLIER_NAME: &str = "supplierName";
    pub const SUPPLIER_CODE: &str = "supplierCode";
    pub const IDENTIFICATION_NUMBER: &str = "identificationNumber";
    pub const AMENDMENT_REASON: &str = "amendmentReason";
    pub const DESCRIPTION: &str = "description";
    pub const TERMINATION_STATUS: &str = "terminationStatus";
    pub const TERMINATION_DATE: &str = "terminationDate";
    pub const TERMINATION_REASON: &str = "terminationReason";
    pub const CONTRACT_ID: &str = "contractId";
    pub const EXTENSION_DATE: &str = "extensionDate";
    pub const EXTENSION_REASON: &str = "extensionReason";
    pub const MODIFICATION: &str = "modification";
    pub const APPLICABLE_OPTIONS: &str = "applicableOptions";
    pub const UPDATE_TYPE: &str = "updateType";
    pub const DETAIL: &str = "detail";
    pub const FILE_PATH: &str = "filePath";
}

/// One immutable scenario-data record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub sno: String,
    fields: BTreeMap<String, String>,
}

impl ScenarioRow {
    pub fn new(sno: impl Into<String>) -> Self {
        Self {
            sno: sno.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion, for fixtures and tests.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// A trimmed field value; blank values read as absent.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// The mandatory free-text query driving the conversation.
    pub fn query(&self) -> Option<&str> {
        self.get(fields::QUERY)
    }

    pub fn require(&self, field: &str) -> Result<&str, FlowError> {
        self.get(field).ok_or_else(|| FlowError::MissingField {
            sno: self.sno.clone(),
            field: field.to_string(),
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }
}
