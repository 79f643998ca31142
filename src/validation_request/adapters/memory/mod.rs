//! In-memory adapter implementations for testing.

mod request;

pub use request::InMemoryValidationRequestRepository;
