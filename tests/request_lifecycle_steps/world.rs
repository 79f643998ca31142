//! Shared world state for request lifecycle BDD scenarios.

use std::sync::Arc;

use casework::case::{
    adapters::{
        memory::InMemoryCaseRepository, task_hooks::TaskTreeHooks,
        templates::BuiltinTemplateSource,
    },
    domain::{CaseId, UserId},
    services::CaseService,
};
use casework::config::CaseworkConfig;
use casework::task_tree::{adapters::memory::InMemoryTaskTreeRepository, services::TaskTreeService};
use casework::validation_request::{
    adapters::memory::InMemoryValidationRequestRepository,
    domain::{Actor, ValidationRequest},
    services::{ValidationRequestService, ValidationRequestServiceError},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Case service type used by the BDD world.
pub type TestCasework = CaseService<
    InMemoryCaseRepository,
    InMemoryTaskTreeRepository,
    InMemoryValidationRequestRepository,
    TaskTreeHooks<InMemoryTaskTreeRepository, DefaultClock>,
    DefaultClock,
>;

/// Scenario world for request lifecycle behaviour tests.
pub struct RequestLifecycleWorld {
    pub casework: TestCasework,
    pub officer: Actor,
    pub case_id: Option<CaseId>,
    pub request: Option<ValidationRequest>,
    pub last_error: Option<ValidationRequestServiceError>,
}

impl RequestLifecycleWorld {
    /// Creates a world with services wired over in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        let config = CaseworkConfig::default();
        let clock = Arc::new(DefaultClock);
        let cases = Arc::new(InMemoryCaseRepository::new());
        let tasks =
            TaskTreeService::new(Arc::new(InMemoryTaskTreeRepository::new()), clock.clone());
        let hooks = Arc::new(TaskTreeHooks::new(tasks.clone(), config.bindings.clone()));
        let requests = ValidationRequestService::new(
            Arc::new(InMemoryValidationRequestRepository::new()),
            cases.clone(),
            hooks,
            clock.clone(),
            config.lifecycle,
        );
        let casework = CaseService::new(
            cases,
            Arc::new(BuiltinTemplateSource::new()),
            tasks,
            requests,
            clock,
        )
        .with_consultation_task_path(config.consultation_task_path);

        Self {
            casework,
            officer: Actor::Officer(UserId::new()),
            case_id: None,
            request: None,
            last_error: None,
        }
    }

    /// Returns the scenario's case.
    ///
    /// # Errors
    ///
    /// Returns an error when no case has been opened.
    pub fn case_id(&self) -> Result<CaseId, eyre::Report> {
        self.case_id
            .ok_or_else(|| eyre::eyre!("missing case in scenario world"))
    }

    /// Returns the scenario's current request.
    ///
    /// # Errors
    ///
    /// Returns an error when no request has been raised.
    pub fn request(&self) -> Result<&ValidationRequest, eyre::Report> {
        self.request
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing request in scenario world"))
    }

    /// Records the outcome of an action on the current request.
    pub fn record(&mut self, result: Result<ValidationRequest, ValidationRequestServiceError>) {
        match result {
            Ok(request) => self.request = Some(request),
            Err(err) => self.last_error = Some(err),
        }
    }
}

impl Default for RequestLifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RequestLifecycleWorld {
    RequestLifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
