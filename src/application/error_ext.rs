//! Error conversion helpers for backend calls
//!
//! Provides extension traits for cleaner error handling with call context.

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::InfraError;

/// Extension trait for converting `InfraResult` to `ApplicationResult` with context.
pub trait InfraResultExt<T> {
    /// Add call context to a backend error.
    ///
    /// # Example
    /// ```ignore
    /// self.backend.fetch_children(&parent).await
    ///     .with_context("fetch children", &parent)?;
    /// ```
    fn with_context(self, action: &str, subject: impl std::fmt::Display) -> ApplicationResult<T>;
}

impl<T> InfraResultExt<T> for Result<T, InfraError> {
    fn with_context(self, action: &str, subject: impl std::fmt::Display) -> ApplicationResult<T> {
        self.map_err(|e| match e {
            InfraError::Application(inner) => inner,
            InfraError::Http { status: 404, .. } => ApplicationError::NotFound(subject.to_string()),
            other => ApplicationError::OperationFailed {
                context: format!("{}: {}", action, subject),
                source: Box::new(other),
            },
        })
    }
}
