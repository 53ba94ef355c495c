//! Semantic element resolution.
//!
//! The target UI has no stable automation API: ARIA roles, accessible names
//! and free text all vary across app builds. Each semantic intent ("the
//! Proceed button") therefore maps to an ordered list of locator strategies,
//! evaluated in sequence until one yields a visible match — exact role+name
//! first, then flexible text, then structural fallback. Candidate sets are
//! recomputed per interaction, never persisted.

pub mod errors;
pub mod intents;
pub mod resolver;

pub use errors::ResolveError;
pub use intents::Intent;
pub use resolver::{flexible_pattern, Resolver, SelectionTier, ToggleOutcome};
