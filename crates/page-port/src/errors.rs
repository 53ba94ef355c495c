//! Error types for page interactions.

use thiserror::Error;

/// Failures surfaced by a [`crate::PagePort`] implementation.
#[derive(Debug, Error, Clone)]
pub enum PageError {
    /// The element handle no longer refers to a live node.
    #[error("stale element: {0}")]
    Stale(String),

    /// The element exists but cannot receive the interaction.
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    /// The page or browser context has been closed.
    #[error("page closed")]
    Closed,

    /// Anything the underlying driver reports that has no mapping above.
    #[error("driver error: {0}")]
    Driver(String),
}

impl PageError {
    /// Interaction failures worth escalating to the next click tier.
    pub fn is_escalatable(&self) -> bool {
        matches!(self, PageError::NotInteractable(_) | PageError::Driver(_))
    }
}
