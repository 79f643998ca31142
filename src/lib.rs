//! Casework: case records, checklist task trees and validation requests for
//! planning case management.
//!
//! A planning case is opened from a submission, seeded with a checklist of
//! tasks from its case type's template, and worked through by an officer.
//! While validating the application the officer raises validation requests
//! asking the applicant to correct or supply information; those requests
//! drive the status of their bound checklist tasks.
//!
//! # Architecture
//!
//! Casework follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence and cross-context
//!   reactions
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//! - **Services**: Orchestration of domain transitions and persistence
//!
//! # Modules
//!
//! - [`validation_request`]: Request lifecycle state machine
//! - [`task_tree`]: Per-case checklist trees, status reactions and rollups
//! - [`case`]: Case record aggregate, templates and milestone orchestration
//! - [`config`]: Tunable limits and request-to-task bindings
//! - [`error`]: Error classification shared by the services
//!
//! # Wiring
//!
//! ```
//! use casework::case::adapters::memory::InMemoryCaseRepository;
//! use casework::case::adapters::task_hooks::TaskTreeHooks;
//! use casework::case::adapters::templates::BuiltinTemplateSource;
//! use casework::case::services::CaseService;
//! use casework::config::CaseworkConfig;
//! use casework::task_tree::adapters::memory::InMemoryTaskTreeRepository;
//! use casework::task_tree::services::TaskTreeService;
//! use casework::validation_request::adapters::memory::InMemoryValidationRequestRepository;
//! use casework::validation_request::services::ValidationRequestService;
//! use mockable::DefaultClock;
//! use std::sync::Arc;
//!
//! let config = CaseworkConfig::default();
//! let clock = Arc::new(DefaultClock);
//! let cases = Arc::new(InMemoryCaseRepository::new());
//! let tasks = TaskTreeService::new(Arc::new(InMemoryTaskTreeRepository::new()), clock.clone());
//! let hooks = Arc::new(TaskTreeHooks::new(tasks.clone(), config.bindings.clone()));
//! let requests = ValidationRequestService::new(
//!     Arc::new(InMemoryValidationRequestRepository::new()),
//!     cases.clone(),
//!     hooks,
//!     clock.clone(),
//!     config.lifecycle,
//! );
//! let service = CaseService::new(
//!     cases,
//!     Arc::new(BuiltinTemplateSource::new()),
//!     tasks,
//!     requests,
//!     clock,
//! )
//! .with_consultation_task_path(config.consultation_task_path.clone());
//! # let _ = service;
//! ```

mod ids;

pub mod case;
pub mod config;
pub mod error;
pub mod task_tree;
pub mod validation_request;
