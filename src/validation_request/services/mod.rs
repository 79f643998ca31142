//! Application services for the validation request lifecycle.

mod lifecycle;

pub use lifecycle::{
    CreateRequest, EditRequest, ValidationRequestService, ValidationRequestServiceError,
    ValidationRequestServiceResult,
};
