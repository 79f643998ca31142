//! Per-case task trees.
//!
//! Each case carries a forest of tasks seeded from a case-type template and
//! addressed by slug path. Officers move task statuses directly; the
//! validation request lifecycle moves them indirectly through the reaction
//! methods on [`services::TaskTreeService`]. Parent statuses are never stored:
//! they are rolled up from children when read.
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
