//! Cross-context error classification.
//!
//! Every service error maps onto an [`ErrorKind`] so that presentation code
//! can pick a response without matching on each context's variants.

use std::fmt;

/// Broad category of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The state change is not permitted from the current state or to the
    /// acting party. Callers should re-read and re-render.
    IllegalTransition,
    /// Creating the record would duplicate an unresolved single-instance
    /// request.
    Conflict,
    /// A referenced record or slug path does not exist.
    NotFound,
    /// Input failed field-level validation.
    SchemaValidation,
    /// Task templates or other configuration are unusable.
    Configuration,
    /// Storage failed.
    Persistence,
}

impl ErrorKind {
    /// Returns a stable machine-readable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IllegalTransition => "illegal_transition",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::SchemaValidation => "schema_validation",
            Self::Configuration => "configuration",
            Self::Persistence => "persistence",
        }
    }

    /// Returns `true` when the end user can act on the failure.
    #[must_use]
    pub const fn is_user_facing(self) -> bool {
        matches!(
            self,
            Self::IllegalTransition | Self::Conflict | Self::SchemaValidation
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
