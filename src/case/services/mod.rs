//! Application services for case records.

mod record;

pub use record::{CaseService, CaseServiceError, CaseServiceResult, OpenCase};
