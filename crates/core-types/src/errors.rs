//! Error taxonomy shared by the resolver, finalizer and workflow crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot of the page at the moment a mandatory step failed.
///
/// Enough context for headless CI triage without reproducing the failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDiagnostics {
    pub url: String,
    pub title: String,
    pub body_snippet: String,
}

impl PageDiagnostics {
    /// Maximum length of the captured body text.
    pub const SNIPPET_MAX: usize = 600;

    pub fn new(url: impl Into<String>, title: impl Into<String>, body: &str) -> Self {
        let mut snippet: String = body.chars().take(Self::SNIPPET_MAX).collect();
        if body.chars().count() > Self::SNIPPET_MAX {
            snippet.push('…');
        }
        Self {
            url: url.into(),
            title: title.into(),
            body_snippet: snippet,
        }
    }
}

impl fmt::Display for PageDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "url={} title={:?} body={:?}",
            self.url, self.title, self.body_snippet
        )
    }
}

/// Failures a workflow invocation can surface to its caller.
///
/// Optional steps never produce these; they skip and log instead. A mandatory
/// failure aborts only its own invocation.
#[derive(Debug, Error, Clone)]
pub enum FlowError {
    /// A mandatory UI control never became visible/enabled within its bounded wait.
    #[error("workflow '{workflow}': required element '{intent}' never appeared ({diagnostics})")]
    RequiredElementTimeout {
        workflow: String,
        intent: String,
        diagnostics: PageDiagnostics,
    },

    /// The scenario row carries a value no handler exists for.
    #[error("unsupported value '{value}' for {field}; supported: {supported:?}")]
    UnsupportedScenario {
        field: String,
        value: String,
        supported: Vec<String>,
    },

    /// None of the terminal signals appeared within the end-timeout.
    #[error("no terminal state reached within {waited_ms}ms ({diagnostics})")]
    TerminalTimeout {
        waited_ms: u64,
        diagnostics: PageDiagnostics,
    },

    /// A date string was not in ISO (YYYY-MM-DD) or day-first (DD/MM/YYYY) form.
    #[error("unparseable date '{0}'; expected YYYY-MM-DD or DD/MM/YYYY")]
    InvalidDate(String),

    /// The widget never rendered a recognizable form of the target date.
    #[error("date widget shows {shown:?}, expected a rendering of {expected}")]
    DateNotApplied { expected: String, shown: String },

    /// A required scenario-row field is absent or blank.
    #[error("scenario '{sno}' is missing required field '{field}'")]
    MissingField { sno: String, field: String },

    /// Underlying page/driver failure during a mandatory interaction.
    #[error("page error: {0}")]
    Page(String),

    /// Scenario-data lookup failure, forwarded from the row provider.
    #[error("scenario data error: {0}")]
    Data(String),
}

impl FlowError {
    /// True when the failure is a bounded-wait expiry rather than bad input.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FlowError::RequiredElementTimeout { .. } | FlowError::TerminalTimeout { .. }
        )
    }
}
