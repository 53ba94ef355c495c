//! Timeout and retry policy for workflow execution.
//!
//! The target UI streams its responses with no deterministic "done" event, so
//! every wait is bounded per call site. Prompt-class waits are deliberately
//! generous; the slowest known AI step takes minutes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounded-wait budgets, in milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowTimeouts {
    /// Interval between poll attempts inside any bounded wait.
    pub poll_ms: u64,
    /// Unconditional settle delay when the activity counter is absent.
    pub settle_ms: u64,
    /// Inner window for polling the activity counter for a change.
    pub heartbeat_ms: u64,
    /// Window for discovering the activity counter element at all.
    pub lookup_ms: u64,
    /// Ordinary control appearance (buttons, dropdowns).
    pub control_ms: u64,
    /// AI-generated prompt/response appearance.
    pub prompt_ms: u64,
    /// The slowest known AI steps (summary screens).
    pub slow_prompt_ms: u64,
    /// Grace window for optional steps; absence within it is a logged skip.
    pub optional_ms: u64,
    /// Overall finalizer budget.
    pub end_ms: u64,
    /// Finalizer budget for workflows with a slow summary step.
    pub extended_end_ms: u64,
    /// Grace window for "Send for Validation" to appear before falling back.
    pub validation_grace_ms: u64,
}

impl FlowTimeouts {
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn lookup(&self) -> Duration {
        Duration::from_millis(self.lookup_ms)
    }

    pub fn control(&self) -> Duration {
        Duration::from_millis(self.control_ms)
    }

    pub fn prompt(&self) -> Duration {
        Duration::from_millis(self.prompt_ms)
    }

    pub fn slow_prompt(&self) -> Duration {
        Duration::from_millis(self.slow_prompt_ms)
    }

    pub fn optional(&self) -> Duration {
        Duration::from_millis(self.optional_ms)
    }

    pub fn end(&self) -> Duration {
        Duration::from_millis(self.end_ms)
    }

    pub fn extended_end(&self) -> Duration {
        Duration::from_millis(self.extended_end_ms)
    }

    pub fn validation_grace(&self) -> Duration {
        Duration::from_millis(self.validation_grace_ms)
    }
}

impl Default for FlowTimeouts {
    fn default() -> Self {
        Self {
            poll_ms: 250,
            settle_ms: 1_500,
            heartbeat_ms: 8_000,
            lookup_ms: 2_000,
            control_ms: 30_000,
            prompt_ms: 120_000,
            slow_prompt_ms: 1_200_000,
            optional_ms: 10_000,
            end_ms: 180_000,
            extended_end_ms: 600_000,
            validation_grace_ms: 15_000,
        }
    }
}

/// Execution policy view passed into every workflow invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowPolicy {
    pub timeouts: FlowTimeouts,
    /// Attempts for the dropdown open loop (chevron click, spinner wait, retry).
    pub dropdown_open_attempts: u32,
    /// Passes over the date-control opener candidates before giving up.
    pub date_open_passes: u32,
    /// Whether to dismiss a blocking FAQ overlay before unrelated interactions.
    pub dismiss_blocking_dialogs: bool,
}

impl Default for FlowPolicy {
    fn default() -> Self {
        Self {
            timeouts: FlowTimeouts::default(),
            dropdown_open_attempts: 6,
            date_open_passes: 3,
            dismiss_blocking_dialogs: true,
        }
    }
}

impl FlowPolicy {
    /// Tight budgets for rehearsal runs and tests against the scripted page.
    pub fn rehearsal() -> Self {
        Self {
            timeouts: FlowTimeouts {
                poll_ms: 5,
                settle_ms: 10,
                heartbeat_ms: 60,
                lookup_ms: 25,
                control_ms: 500,
                prompt_ms: 500,
                slow_prompt_ms: 500,
                optional_ms: 50,
                end_ms: 500,
                extended_end_ms: 500,
                validation_grace_ms: 50,
            },
            dropdown_open_attempts: 6,
            date_open_passes: 3,
            dismiss_blocking_dialogs: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budgets_are_bounded_and_ordered() {
        let t = FlowTimeouts::default();
        assert!(t.poll() < t.settle());
        assert!(t.control() < t.prompt());
        assert!(t.prompt() < t.slow_prompt());
        assert!(t.end() < t.extended_end());
    }

    #[test]
    fn rehearsal_policy_is_fast() {
        let p = FlowPolicy::rehearsal();
        assert!(p.timeouts.end() <= Duration::from_secs(1));
        assert_eq!(p.dropdown_open_attempts, 6);
    }
}
