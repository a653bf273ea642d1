//! Errors surfaced by a context or its transport

/// Failure of an operation against the system under test
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The system rejected the operation
    #[error("operation rejected: {0}")]
    Rejected(String),

    /// Asset is not listed in the configuration
    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    /// Alias could not be mapped to an account or asset
    #[error("unknown alias: {0}")]
    UnknownAlias(String),

    /// Snapshot could not be taken or restored
    #[error("snapshot failed: {0}")]
    Snapshot(String),

    /// Transport to the system failed
    #[error("transport error: {0}")]
    Transport(String),
}

impl ContextError {
    /// Create a rejection error
    #[inline]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Check if the system itself refused the operation
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
