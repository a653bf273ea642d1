//! Execution lifecycle
//!
//! ```text
//! Built → Filtering → Solving → Applying → Verifying → Executing → TornDown
//! Built, Filtering                                   → Skipped
//! Filtering, Solving, Applying, Verifying            → TornDown
//! ```

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a scenario execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Registered, nothing done yet
    Built,
    /// Evaluating the admission filter
    Filtering,
    /// Constraints compiling the requirement
    Solving,
    /// Solutions being applied
    Applying,
    /// Post-conditions being checked
    Verifying,
    /// Body running
    Executing,
    /// Snapshot restored (terminal)
    TornDown,
    /// Not run (terminal)
    Skipped,
}

impl Stage {
    /// Check if no transition leaves this stage
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

/// Stages reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: Stage) -> Vec<Stage> {
    use Stage::{Applying, Built, Executing, Filtering, Skipped, Solving, TornDown, Verifying};
    match from {
        Built => vec![Filtering, Skipped],
        Filtering => vec![Solving, Skipped, TornDown],
        Solving => vec![Applying, TornDown],
        Applying => vec![Verifying, Executing, TornDown],
        Verifying => vec![Executing, TornDown],
        Executing => vec![TornDown],
        TornDown | Skipped => vec![],
    }
}

/// Check a transition against [`allowed_transitions`]
#[must_use]
pub fn is_allowed(from: Stage, to: Stage) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Stage history of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lifecycle {
    stages: Vec<Stage>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            stages: vec![Stage::Built],
        }
    }

    pub(crate) fn current(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Built)
    }

    /// Move to `to`; illegal moves are logged and ignored
    pub(crate) fn advance(&mut self, to: Stage) {
        let from = self.current();
        if is_allowed(from, to) {
            self.stages.push(to);
        } else {
            tracing::error!(?from, ?to, "illegal stage transition");
            debug_assert!(false, "illegal stage transition {from:?} -> {to:?}");
        }
    }

    pub(crate) fn into_stages(self) -> Vec<Stage> {
        self.stages
    }
}
