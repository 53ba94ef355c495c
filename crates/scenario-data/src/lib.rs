//! Scenario-data providers.
//!
//! Workflows look rows up through [`RowProvider`]; how rows are sourced
//! (CSV file, in-memory fixture) is irrelevant to them. Lookups for unknown
//! keys fail with the full list of available keys, and rows with a blank
//! mandatory query field are rejected at lookup time.

mod csv_provider;
mod provider;

pub use csv_provider::CsvProvider;
pub use provider::{DataError, MemoryProvider, RowProvider};
