//! Case records and the glue binding them to task trees and requests.
//!
//! Opening a case seeds its task tree from a case-type template. Case
//! milestones, such as entering assessment, are applied here and fanned out
//! to the request lifecycle.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
