//! In-memory adapter implementations for testing.

mod case;

pub use case::InMemoryCaseRepository;
