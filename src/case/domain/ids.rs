//! Identifier types for the case domain.

use crate::ids::uuid_identifier;

uuid_identifier!(
    /// Opaque identifier of a case record.
    CaseId
);

uuid_identifier!(
    /// Reference to the local planning authority that owns a case.
    LocalAuthorityId
);

uuid_identifier!(
    /// Reference to an officer account.
    UserId
);

uuid_identifier!(
    /// Reference to the citizen submission a case was opened from.
    SubmissionId
);
