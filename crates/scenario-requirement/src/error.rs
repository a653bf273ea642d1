//! Error types for requirement construction, resolution and fuzzing

/// Errors raised while building or expanding a requirement
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequirementError {
    /// Dimension name was empty
    #[error("requirement dimension name must not be empty")]
    EmptyDimension,

    /// Range cannot be enumerated
    #[error("malformed range {start}..{end} step {step}")]
    MalformedRange {
        /// Inclusive start
        start: i64,
        /// Exclusive end
        end: i64,
        /// Step between values
        step: u64,
    },

    /// A requirement document was not a JSON object
    #[error("requirement must be a JSON object, got {found}")]
    NotAnObject {
        /// The offending document
        found: String,
    },

    /// A context-dependent spec failed to resolve
    #[error("failed to resolve dimension `{dimension}`: {source}")]
    Resolution {
        /// Dimension whose resolver failed
        dimension: String,
        /// Underlying failure
        #[source]
        source: ResolveError,
    },
}

/// Failure reported by a context-dependent value spec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The context lacks something the resolver needs
    #[error("missing context value: {0}")]
    Missing(String),

    /// Any other resolver failure
    #[error("{0}")]
    Other(String),
}

impl ResolveError {
    /// Create a missing-value error
    #[inline]
    pub fn missing(what: impl Into<String>) -> Self {
        Self::Missing(what.into())
    }

    /// Create a generic resolver error
    #[inline]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
