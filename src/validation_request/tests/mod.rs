//! Unit tests for the validation request module.
//!
//! Tests are organised by concern: the aggregate's state machine, attribute
//! schemas, the in-memory repository's write-time invariants, the lifecycle
//! service and `PostgreSQL` row conversion.
