//! Error types for solving and checking constraints

use scenario_context::ContextError;
use scenario_requirement::RequirementError;

/// Failure while compiling a requirement into solutions
#[derive(Debug, Clone, thiserror::Error)]
pub enum SolveError {
    /// Resolution or fuzzing of the requirement failed
    #[error(transparent)]
    Requirement(#[from] RequirementError),

    /// A concrete value has the wrong shape for its dimension
    #[error("invalid `{dimension}` value: {reason}")]
    InvalidValue {
        /// Dimension holding the value
        dimension: String,
        /// What is wrong with it
        reason: String,
    },

    /// The context could not answer a query needed to solve
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl SolveError {
    /// Create an invalid-value error
    #[inline]
    pub fn invalid(dimension: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            dimension: dimension.into(),
            reason: reason.into(),
        }
    }

    /// Check if the failure happened before any solution could be built
    /// because a value spec could not be resolved or enumerated
    #[inline]
    #[must_use]
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Requirement(_))
    }
}

/// Post-condition failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckError {
    /// The context does not satisfy the requirement
    #[error("`{dimension}` not satisfied for {subject}: expected {expected}, found {actual}")]
    Unsatisfied {
        /// Dimension being checked
        dimension: String,
        /// Field, asset or account the mismatch is about
        subject: String,
        /// Required value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// The requirement could not be interpreted
    #[error(transparent)]
    Solve(#[from] SolveError),

    /// The context could not be read
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl CheckError {
    /// Create an unsatisfied error
    pub fn unsatisfied(
        dimension: impl Into<String>,
        subject: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::Unsatisfied {
            dimension: dimension.into(),
            subject: subject.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
