use thiserror::Error as ThisError;

///
/// BackendError
///
/// Opaque failure raised by a backend shard query. The coordination layer
/// never interprets these; they propagate to the caller unmodified.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

///
/// Error
///
/// Coordination-layer error taxonomy.
///
/// - `Unsupported`: the operation is excluded by scope and always fails
///   immediately, it is never partially executed.
/// - `InvalidState`: the handle cannot answer without initialization.
/// - `Invariant`: merged rows violated a structural expectation of the
///   post-merge pipeline.
/// - `Backend`: propagated from a shard query without suppression,
///   rollback, or cross-shard compensation.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl Error {
    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }
}
