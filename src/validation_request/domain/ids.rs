//! Identifier and scalar types for the validation request domain.

use crate::ids::uuid_identifier;
use serde::{Deserialize, Serialize};
use std::fmt;

uuid_identifier!(
    /// Unique identifier for a validation request.
    RequestId
);

uuid_identifier!(
    /// Reference to a planning condition attached to a case.
    ConditionId
);

uuid_identifier!(
    /// Reference to a document held by the external document store.
    DocumentId
);

/// Per-case request number, used for citizen-facing numbering.
///
/// Sequences start at 1 and strictly increase in creation order within a
/// case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestSequence(u32);

impl RequestSequence {
    /// The first sequence number issued in a case.
    pub const FIRST: Self = Self(1);

    /// Wraps a raw sequence value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the following sequence number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RequestSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
