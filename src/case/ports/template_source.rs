//! Port supplying the task template for each case type.

use crate::case::domain::CaseType;
use crate::task_tree::domain::{TaskTemplate, TaskTreeDomainError};
use std::sync::Arc;
use thiserror::Error;

/// Result type for template lookups.
pub type TemplateSourceResult<T> = Result<T, TemplateSourceError>;

/// Supplies the ordered task template used once when a case is opened.
pub trait TaskTemplateSource: Send + Sync {
    /// Returns the validated template for `case_type`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateSourceError::Missing`] when no template is defined,
    /// [`TemplateSourceError::Invalid`] when it breaks sibling uniqueness, or
    /// [`TemplateSourceError::Io`] when it cannot be read.
    fn template_for(&self, case_type: CaseType) -> TemplateSourceResult<TaskTemplate>;
}

/// Errors returned by template sources.
#[derive(Debug, Clone, Error)]
pub enum TemplateSourceError {
    /// No template exists for the case type.
    #[error("no task template for case type {0}")]
    Missing(CaseType),

    /// The template failed validation.
    #[error("invalid task template for {case_type}: {source}")]
    Invalid {
        /// Case type whose template is invalid.
        case_type: CaseType,
        /// Validation failure.
        source: TaskTreeDomainError,
    },

    /// The template could not be read or decoded.
    #[error("failed to load task template: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),
}

impl TemplateSourceError {
    /// Wraps a read or decode failure.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }
}
