//! Run reports
//!
//! One [`ExecutionReport`] per execution, collected into a [`RunReport`] in
//! registration order, then variant order.

use crate::error::{FailureKind, ScenarioError};
use crate::state::Stage;
use chrono::{DateTime, Utc};
use scenario_requirement::ConcreteRequirement;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;
use ulid::Ulid;

/// Identity of one execution: scenario name plus variant index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutionId {
    /// Scenario name
    pub scenario: String,
    /// Variant index; `None` when the scenario has a single execution
    pub variant: Option<usize>,
}

impl ExecutionId {
    /// Id of a single-execution scenario
    #[inline]
    #[must_use]
    pub fn single(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            variant: None,
        }
    }

    /// Id of one of several executions
    #[inline]
    #[must_use]
    pub fn variant(scenario: impl Into<String>, index: usize) -> Self {
        Self {
            scenario: scenario.into(),
            variant: Some(index),
        }
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            Some(index) => write!(f, "{}#{index}", self.scenario),
            None => f.write_str(&self.scenario),
        }
    }
}

impl Serialize for ExecutionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Two or more constraints touching one state key in one execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// Contested key
    pub key: String,
    /// Constraints touching it, in registration order
    pub constraints: Vec<&'static str>,
}

/// Result of one execution
#[derive(Debug)]
pub enum Outcome {
    /// Body completed
    Passed,
    /// Left out by mode or admission filter
    Skipped,
    /// The world could not be prepared, or restored
    SetupFailure(ScenarioError),
    /// The body returned an error or panicked
    Failed(ScenarioError),
}

impl Outcome {
    /// Classify an error by its [`FailureKind`]
    #[must_use]
    pub fn from_error(error: ScenarioError) -> Self {
        match error.kind() {
            FailureKind::Setup => Self::SetupFailure(error),
            FailureKind::Body => Self::Failed(error),
        }
    }

    /// Check if the execution passed
    #[inline]
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if the execution was skipped
    #[inline]
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Failure, if any
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&ScenarioError> {
        match self {
            Self::SetupFailure(e) | Self::Failed(e) => Some(e),
            Self::Passed | Self::Skipped => None,
        }
    }

    fn status(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Skipped => "skipped",
            Self::SetupFailure(_) => "setup_failure",
            Self::Failed(_) => "failed",
        }
    }
}

/// Report of one execution
#[derive(Debug)]
pub struct ExecutionReport {
    /// Execution identity
    pub id: ExecutionId,
    /// Concrete values of every applicable dimension
    pub requirement: ConcreteRequirement,
    /// Result
    pub outcome: Outcome,
    /// Overlapping state mutations detected before applying
    pub conflicts: Vec<Conflict>,
    /// Solutions applied successfully
    pub solutions_applied: usize,
    /// Stages passed through
    pub stages: Vec<Stage>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl ExecutionReport {
    /// JSON rendering
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "status": self.outcome.status(),
            "error": self.outcome.error().map(ToString::to_string),
            "requirement": self.requirement.to_json(),
            "conflicts": self.conflicts,
            "solutions_applied": self.solutions_applied,
            "stages": self.stages,
            "duration_ms": self.duration_ms,
        })
    }
}

/// Outcome counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Executions reported
    pub total: usize,
    /// Passed
    pub passed: usize,
    /// Skipped
    pub skipped: usize,
    /// Setup failures
    pub setup_failures: usize,
    /// Body failures
    pub failed: usize,
}

/// Report of a whole run
#[derive(Debug)]
pub struct RunReport {
    /// Run identity
    pub run_id: Ulid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Executions in registration, then variant, order
    pub executions: Vec<ExecutionReport>,
}

impl RunReport {
    /// Outcome counts
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.executions
            .iter()
            .fold(Summary::default(), |mut summary, execution| {
                summary.total += 1;
                match execution.outcome {
                    Outcome::Passed => summary.passed += 1,
                    Outcome::Skipped => summary.skipped += 1,
                    Outcome::SetupFailure(_) => summary.setup_failures += 1,
                    Outcome::Failed(_) => summary.failed += 1,
                }
                summary
            })
    }

    /// Check if nothing failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.executions
            .iter()
            .all(|e| e.outcome.error().is_none())
    }

    /// Report of one execution
    #[must_use]
    pub fn execution(&self, id: &str) -> Option<&ExecutionReport> {
        self.executions.iter().find(|e| e.id.to_string() == id)
    }

    /// Failed executions of either kind
    pub fn failures(&self) -> impl Iterator<Item = &ExecutionReport> {
        self.executions.iter().filter(|e| e.outcome.error().is_some())
    }

    /// JSON rendering
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "run_id": self.run_id.to_string(),
            "started_at": self.started_at.to_rfc3339(),
            "duration_ms": self.duration_ms,
            "summary": self.summary(),
            "executions": self.executions.iter().map(ExecutionReport::to_json).collect::<Vec<_>>(),
        })
    }
}
