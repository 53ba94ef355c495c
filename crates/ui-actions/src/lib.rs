//! Wait and interaction primitives.
//!
//! The target app streams AI responses with no reliable loading indicator,
//! so synchronization is layered: an advisory activity heartbeat, then a
//! specific bounded wait for the next expected control. Interactions escalate
//! through click tiers instead of failing on the first overlay.

pub mod click;
pub mod waiting;

pub use click::{fill_text, robust_click, submit_text};
pub use waiting::{
    activity_queries, wait_actionable, wait_any, wait_for_activity, wait_gone, wait_present,
};
