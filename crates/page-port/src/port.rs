//! The page capability seam.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::PageError;
use crate::query::ElementQuery;

/// Opaque handle to one concrete element, valid for the current render.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    /// Implementation-defined node identity.
    pub id: String,
    /// Short human label for logs ("button 'Proceed'").
    pub label: String,
}

impl ElementRef {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Observable state of one element at one instant.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ElementState {
    pub visible: bool,
    pub enabled: bool,
    /// Selection marker for listbox/multi-select options.
    pub selected: bool,
    /// Checked marker for checkboxes and radios.
    pub checked: bool,
    pub text: String,
    /// Current input value, empty for non-inputs.
    pub value: String,
    /// Concatenated aria-label/aria-valuetext, for widgets that render there.
    pub aria_text: String,
    /// Bounding box `(x, y, width, height)` in page coordinates, if laid out.
    pub bbox: Option<(f64, f64, f64, f64)>,
}

impl ElementState {
    /// Center point for synthetic pointer events.
    pub fn center(&self) -> Option<(f64, f64)> {
        self.bbox.map(|(x, y, w, h)| (x + w / 2.0, y + h / 2.0))
    }

    /// All textual renderings of this element, for content assertions.
    pub fn all_text(&self) -> String {
        let mut out = String::new();
        for part in [&self.text, &self.value, &self.aria_text] {
            if !part.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(part);
            }
        }
        out
    }
}

/// A live, navigated application page.
///
/// Exclusively owned by one workflow invocation for its lifetime. Any
/// browser-automation layer satisfying this capability set is substitutable.
#[async_trait]
pub trait PagePort: Send + Sync {
    /// All elements currently matching `query`, in document order.
    async fn query(&self, query: &ElementQuery) -> Result<Vec<ElementRef>, PageError>;

    async fn state(&self, element: &ElementRef) -> Result<ElementState, PageError>;

    /// Ordinary click, honoring visibility and enablement.
    async fn click(&self, element: &ElementRef) -> Result<(), PageError>;

    /// Click bypassing overlay/visibility checks.
    async fn force_click(&self, element: &ElementRef) -> Result<(), PageError>;

    /// Synthetic pointer event at page coordinates.
    async fn pointer_click(&self, x: f64, y: f64) -> Result<(), PageError>;

    async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), PageError>;

    async fn press(&self, element: &ElementRef, key: &str) -> Result<(), PageError>;

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), PageError>;

    /// File-chooser interception: attach `paths` via this specific control.
    async fn set_input_files(
        &self,
        element: &ElementRef,
        paths: &[PathBuf],
    ) -> Result<(), PageError>;

    async fn url(&self) -> String;

    async fn title(&self) -> String;

    /// Full visible body text, for failure snapshots and content assertions.
    async fn body_text(&self) -> String;
}
