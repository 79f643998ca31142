//! Error types for validation request transitions, validation and parsing.

use super::{RequestId, RequestState, RequestType};
use std::fmt;
use thiserror::Error;

/// Transition or edit attempted on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestAction {
    /// Send the request to the applicant.
    Dispatch,
    /// Record the applicant's answer.
    Respond,
    /// Withdraw the request.
    Cancel,
    /// Close the request on a case milestone.
    AutoClose,
    /// Amend officer-authored fields.
    Edit,
}

impl RequestAction {
    /// Returns the action as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::Respond => "respond",
            Self::Cancel => "cancel",
            Self::AutoClose => "auto_close",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level problem found while validating request input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human-readable description of the problem.
    pub reason: String,
}

impl AttributeError {
    /// Creates a field-level error.
    #[must_use]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Errors returned by validation request domain operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationRequestDomainError {
    /// The action is not permitted from the request's current state.
    #[error("cannot {action} request {request_id} while it is {from}")]
    IllegalTransition {
        /// Request identifier.
        request_id: RequestId,
        /// State the request was in.
        from: RequestState,
        /// Attempted action.
        action: RequestAction,
    },

    /// The action is not available to the acting party.
    #[error("{actor} may not {action} request {request_id}")]
    ActorNotPermitted {
        /// Request identifier.
        request_id: RequestId,
        /// Attempted action.
        action: RequestAction,
        /// Kind of the acting party.
        actor: &'static str,
    },

    /// The request type is not closed by case milestones.
    #[error("request {request_id} of type {request_type} is not milestone-sensitive")]
    NotMilestoneSensitive {
        /// Request identifier.
        request_id: RequestId,
        /// Request type.
        request_type: RequestType,
    },

    /// Request input failed field-level validation.
    #[error("invalid {request_type} request: {}", format_attribute_errors(.errors))]
    SchemaValidation {
        /// Request type whose schema was applied.
        request_type: RequestType,
        /// Individual field failures.
        errors: Vec<AttributeError>,
    },
}

fn format_attribute_errors(errors: &[AttributeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error returned while parsing request types from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown request type: {0}")]
pub struct ParseRequestTypeError(pub String);

/// Error returned while parsing request states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown request state: {0}")]
pub struct ParseRequestStateError(pub String);

/// Error returned while parsing a persisted request owner discriminant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown request owner kind: {0}")]
pub struct ParseRequestOwnerError(pub String);
