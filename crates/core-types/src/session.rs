//! Process-wide authenticated-session artifact, as an explicit dependency.
//!
//! Constructed once by suite setup before any workflow's first navigation and
//! passed by reference into page-context creation. Read-only thereafter; no
//! module-level mutable state.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub struct SessionProvider {
    storage_state: Option<PathBuf>,
    created_at: DateTime<Utc>,
}

impl SessionProvider {
    /// A session backed by a persisted storage-state file.
    pub fn from_storage_state(path: impl Into<PathBuf>) -> Self {
        Self {
            storage_state: Some(path.into()),
            created_at: Utc::now(),
        }
    }

    /// A session with no persisted artifact (rehearsal runs).
    pub fn ephemeral() -> Self {
        Self {
            storage_state: None,
            created_at: Utc::now(),
        }
    }

    pub fn storage_state(&self) -> Option<&Path> {
        self.storage_state.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
