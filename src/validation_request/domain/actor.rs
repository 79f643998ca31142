//! Parties that drive request transitions.

use crate::case::domain::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who is performing a transition.
///
/// Identities are supplied by the caller; this type carries authorship, it
/// does not authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Actor {
    /// A council officer.
    Officer(UserId),
    /// The applicant or their agent.
    Applicant,
    /// The system reacting to a case milestone.
    System,
}

impl Actor {
    /// Returns the actor kind as a string slice.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Officer(_) => "officer",
            Self::Applicant => "applicant",
            Self::System => "system",
        }
    }

    /// Returns the officer identifier when the actor is an officer.
    #[must_use]
    pub const fn officer(&self) -> Option<UserId> {
        match self {
            Self::Officer(user) => Some(*user),
            Self::Applicant | Self::System => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Officer(user) => write!(f, "officer:{user}"),
            Self::Applicant | Self::System => f.write_str(self.kind()),
        }
    }
}
