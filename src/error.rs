use thiserror::Error;

/// Why a command, undo or redo did not take effect.
///
/// These travel inside a [`CommandResult`](crate::CommandResult) rather than
/// being raised; history is left untouched whenever one is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl CommandError {
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }
}

/// Errors from configuration and from (de)serializing history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid history record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// The buffer refused a mutation, e.g. because it is read-only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ApplyError(pub String);

impl From<ApplyError> for CommandError {
    fn from(error: ApplyError) -> Self {
        Self::OperationFailed(error.0)
    }
}
