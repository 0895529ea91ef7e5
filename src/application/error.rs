//! Errors raised by the process services and the tree driver.

use thiserror::Error;

use crate::domain::DomainError;

/// Failure of a catalog operation. Backend failures arrive through
/// `InfraResultExt::with_context` and keep their cause as `source`.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("invalid input: {message}")]
    Validation { message: String },

    #[error("process not found: {0}")]
    NotFound(String),

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
