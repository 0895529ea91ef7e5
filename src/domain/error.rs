//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::ProcessId;

/// Domain errors represent misuse of the tree state machine.
/// Backend failures never surface here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node is no longer part of the tree")]
    UnknownNode,

    #[error("process {0} is not expanded")]
    NotExpanded(ProcessId),

    #[error("children of {0} are not loaded")]
    ChildrenNotLoaded(ProcessId),

    #[error("{child} is not a child of {parent}")]
    UnknownChild { parent: ProcessId, child: ProcessId },

    #[error("invalid reorder of {parent}: {message}")]
    InvalidReorder { parent: ProcessId, message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
