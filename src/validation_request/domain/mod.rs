//! Domain model for validation requests.
//!
//! A validation request asks the applicant to correct or supply something.
//! The aggregate enforces its own state machine and the actor allowed to
//! drive each transition; cross-request invariants (one unresolved request
//! per owner and type, per-case sequence numbers) are enforced by the
//! repository and the lifecycle service.

mod actor;
mod attributes;
mod error;
mod ids;
mod request;
mod request_type;

pub use actor::Actor;
pub use attributes::{
    AdditionalDocumentAttributes, BoundaryChangeAttributes, DescriptionChangeAttributes,
    FeeChangeAttributes, ReplacementDocumentAttributes, SpecificAttributes,
};
pub use error::{
    AttributeError, ParseRequestOwnerError, ParseRequestStateError, ParseRequestTypeError,
    RequestAction, ValidationRequestDomainError,
};
pub use ids::{ConditionId, DocumentId, RequestId, RequestSequence};
pub use request::{
    ApplicantResponse, NewRequestParams, PersistedRequestData, RequestEdit, RequestState,
    ValidationRequest,
};
pub use request_type::{Milestone, RequestOwner, RequestType};
