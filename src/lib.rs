//! CLI driver for the meshpilot workflow suite.
//!
//! The binary wires scenario data, the per-agent state machines and a page
//! implementation together. Only the scripted rehearsal page ships in this
//! build; a live browser adapter plugs in behind `PagePort` without touching
//! anything here.

pub mod rehearsal;
pub mod runner;

pub use runner::{list_scenarios, run_scenario, RunReport};
