//! Error types for scenario runs
//!
//! Every failure of an execution is a [`ScenarioError`]. Failures before the
//! body runs are setup failures; the body's own errors and panics are body
//! failures. See [`ScenarioError::kind`].

use scenario_constraint::{CheckError, SolveError};
use scenario_context::ContextError;
use scenario_requirement::RequirementError;
use serde::{Deserialize, Serialize};

/// Which side of the harness a failure is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The world could not be put into the required state
    Setup,
    /// The scenario body failed
    Body,
}

/// Failure of one scenario execution
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Admission filter returned an error
    #[error("admission filter failed: {0}")]
    Filter(#[source] anyhow::Error),

    /// A value spec could not be resolved or enumerated
    #[error("{constraint}: requirement resolution failed: {source}")]
    Resolution {
        /// Constraint whose requirement failed to resolve
        constraint: &'static str,
        /// Underlying error
        #[source]
        source: RequirementError,
    },

    /// A constraint could not compile its dimensions
    #[error("{constraint}: solve failed: {source}")]
    Solve {
        /// Failing constraint
        constraint: &'static str,
        /// Underlying error
        #[source]
        source: SolveError,
    },

    /// The requirement expanded past the configured cap
    #[error("requirement expands to {count} executions, limit is {limit}")]
    VariantLimit {
        /// Executions the requirement expands to
        count: usize,
        /// Configured cap
        limit: usize,
    },

    /// Two constraints mutate the same state key
    #[error("state key `{key}` is touched by {}", constraints.join(" and "))]
    Conflict {
        /// Contested key
        key: String,
        /// Constraints touching it, in registration order
        constraints: Vec<&'static str>,
    },

    /// A solution was rejected while applying
    #[error("step {step} ({solution}) failed: {source}")]
    Apply {
        /// Position in the execution's solution list
        step: usize,
        /// Solution name
        solution: String,
        /// Underlying error
        #[source]
        source: ContextError,
    },

    /// A post-condition did not hold after applying
    #[error("{constraint}: post-condition failed: {source}")]
    Check {
        /// Failing constraint
        constraint: &'static str,
        /// Underlying error
        #[source]
        source: CheckError,
    },

    /// A filter, resolver, constraint or solution panicked before the body ran
    #[error("setup panicked: {0}")]
    SetupPanicked(String),

    /// The scenario body returned an error
    #[error("body failed: {0:#}")]
    Body(#[source] anyhow::Error),

    /// The scenario body panicked
    #[error("body panicked: {0}")]
    BodyPanicked(String),

    /// A context or snapshot could not be obtained
    #[error("context unavailable: {0}")]
    Context(#[from] ContextError),

    /// The snapshot could not be restored
    #[error("teardown failed: {0}")]
    Teardown(#[source] ContextError),
}

impl ScenarioError {
    /// Wrap a solve failure, separating resolution faults
    #[must_use]
    pub fn from_solve(constraint: &'static str, error: SolveError) -> Self {
        match error {
            SolveError::Requirement(source) => Self::Resolution { constraint, source },
            source => Self::Solve { constraint, source },
        }
    }

    /// Setup or body
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Body(_) | Self::BodyPanicked(_) => FailureKind::Body,
            _ => FailureKind::Setup,
        }
    }

    /// Check if the failure happened outside the body
    #[inline]
    #[must_use]
    pub fn is_setup(&self) -> bool {
        self.kind() == FailureKind::Setup
    }
}

/// Runner configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config is not valid TOML for [`crate::RunnerConfig`]
    #[error("invalid runner config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting has an unusable value
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Setting or environment variable name
        key: String,
        /// Offending value
        value: String,
    },
}

impl ConfigError {
    /// Create an invalid-value error
    #[inline]
    pub fn invalid(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
