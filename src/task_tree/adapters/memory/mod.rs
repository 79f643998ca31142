//! In-memory adapter implementations for testing.

mod task;

pub use task::InMemoryTaskTreeRepository;
