//! Step definitions for validation request lifecycle scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
