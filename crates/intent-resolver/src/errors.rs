//! Error types for intent resolution.

use thiserror::Error;

use meshpilot_core_types::{FlowError, PageDiagnostics};
use meshpilot_page_port::PageError;

/// Failures surfaced by the resolver.
///
/// Ambiguity among candidates is not an error: the tie-break order (exact
/// role+name, then flexible text, then positional fallback) resolves it by
/// policy. Only the "no candidates at all" tier fails.
#[derive(Debug, Error, Clone)]
pub enum ResolveError {
    /// No candidate became visible/actionable within its bounded wait.
    #[error("element not found for '{intent}' ({diagnostics})")]
    NotFound {
        intent: String,
        diagnostics: PageDiagnostics,
    },

    /// A candidate was found but every interaction tier failed on it.
    #[error("interaction with '{intent}' failed: {source}")]
    Interaction {
        intent: String,
        #[source]
        source: PageError,
    },
}

impl ResolveError {
    /// Promote to a workflow-level failure, tagging the workflow name.
    pub fn into_flow(self, workflow: &str) -> FlowError {
        match self {
            ResolveError::NotFound {
                intent,
                diagnostics,
            } => FlowError::RequiredElementTimeout {
                workflow: workflow.to_string(),
                intent,
                diagnostics,
            },
            err @ ResolveError::Interaction { .. } => FlowError::Page(err.to_string()),
        }
    }
}
