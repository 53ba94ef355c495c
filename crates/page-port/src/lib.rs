//! Browser page abstraction for the meshpilot workflow driver.
//!
//! The workflows never talk to a browser engine directly; they act on
//! [`PagePort`], a capability seam any automation layer can implement
//! (element querying by role/name/text/css, click/fill/keyboard, visibility
//! and enablement state, file-chooser interception, failure snapshots).
//!
//! The [`mock`] module ships a scripted in-memory page used by integration
//! tests and by the CLI's rehearsal mode.

pub mod errors;
pub mod mock;
pub mod port;
pub mod query;

pub use errors::PageError;
pub use port::{ElementRef, ElementState, PagePort};
pub use query::{ElementQuery, TextMatch};
