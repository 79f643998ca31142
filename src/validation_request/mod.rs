//! Validation requests raised against a case.
//!
//! A request asks the applicant to approve a change or supply information.
//! Its lifecycle is a small state machine shared by every request type:
//! `pending` requests are dispatched to become `open`, then closed by the
//! applicant's answer, closed automatically by a case milestone, or cancelled
//! by the officer. The module follows hexagonal architecture:
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
