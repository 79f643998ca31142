//! Shared wiring for in-memory casework integration tests.

use casework::case::{
    adapters::{
        memory::InMemoryCaseRepository, task_hooks::TaskTreeHooks,
        templates::BuiltinTemplateSource,
    },
    domain::{CaseId, CaseType, LocalAuthorityId, UserId},
    services::{CaseService, OpenCase},
};
use casework::config::CaseworkConfig;
use casework::task_tree::{
    adapters::memory::InMemoryTaskTreeRepository,
    domain::{SlugPath, Task, TaskStatus},
    services::TaskTreeService,
};
use casework::validation_request::{
    adapters::memory::InMemoryValidationRequestRepository,
    domain::{Actor, RequestOwner, RequestType, ValidationRequest},
    services::{CreateRequest, ValidationRequestServiceResult},
};
use casework::validation_request::services::ValidationRequestService;
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::{Value, json};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

/// Fully wired case service over in-memory adapters.
pub type TestCasework = CaseService<
    InMemoryCaseRepository,
    InMemoryTaskTreeRepository,
    InMemoryValidationRequestRepository,
    TaskTreeHooks<InMemoryTaskTreeRepository, DefaultClock>,
    DefaultClock,
>;

/// Slug path of the description check in the planning template.
pub const DESCRIPTION_TASK: &str =
    "check-and-validate/check-application-details/check-description";

/// Slug path of the supplied documents check in the planning template.
pub const DOCUMENTS_TASK: &str = "check-and-validate/check-documents/check-supplied-documents";

/// Slug path of the red line boundary check in the planning template.
pub const BOUNDARY_TASK: &str =
    "check-and-validate/check-application-details/check-red-line-boundary";

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// Builds the services with `config`.
pub fn services_with(config: CaseworkConfig) -> TestCasework {
    init_tracing();
    let clock = Arc::new(DefaultClock);
    let cases = Arc::new(InMemoryCaseRepository::new());
    let tasks = TaskTreeService::new(Arc::new(InMemoryTaskTreeRepository::new()), clock.clone());
    let hooks = Arc::new(TaskTreeHooks::new(tasks.clone(), config.bindings.clone()));
    let requests = ValidationRequestService::new(
        Arc::new(InMemoryValidationRequestRepository::new()),
        cases.clone(),
        hooks,
        clock.clone(),
        config.lifecycle,
    );
    CaseService::new(
        cases,
        Arc::new(BuiltinTemplateSource::new()),
        tasks,
        requests,
        clock,
    )
    .with_consultation_task_path(config.consultation_task_path)
}

/// Provides services wired with the default configuration.
#[fixture]
pub fn services() -> TestCasework {
    services_with(CaseworkConfig::default())
}

/// Provides an officer actor.
#[fixture]
pub fn officer() -> Actor {
    Actor::Officer(UserId::new())
}

/// Opens a planning application case.
pub async fn open_planning_case(services: &TestCasework) -> CaseId {
    services
        .open(OpenCase {
            case_type: CaseType::PlanningApplication,
            local_authority: LocalAuthorityId::new(),
            submission: None,
        })
        .await
        .expect("case should open")
        .id()
}

/// Parses a slug path literal.
pub fn path(raw: &str) -> SlugPath {
    SlugPath::parse(raw).expect("path should parse")
}

/// Resolves the task at `raw` in `case_id`.
pub async fn task_at(services: &TestCasework, case_id: CaseId, raw: &str) -> Task {
    services
        .tasks()
        .resolve(case_id, &path(raw))
        .await
        .expect("task should resolve")
}

/// Writes `status` on the task at `raw`.
pub async fn set_task_status(
    services: &TestCasework,
    case_id: CaseId,
    raw: &str,
    status: TaskStatus,
) {
    let task = task_at(services, case_id, raw).await;
    services
        .tasks()
        .set_status(task.id(), status)
        .await
        .expect("status should be written");
}

/// Payload for a description change request.
pub fn description_attributes() -> Value {
    json!({
        "proposed_description": "Erection of a single storey rear extension",
        "previous_description": "Rear extension",
    })
}

/// Payload for a red line boundary change request.
pub fn boundary_attributes() -> Value {
    json!({
        "new_geojson": {
            "type": "Polygon",
            "coordinates": [[[0.0, 51.0], [0.1, 51.0], [0.1, 51.1], [0.0, 51.0]]],
        },
    })
}

/// Payload for an additional document request.
pub fn document_attributes() -> Value {
    json!({"document_request_type": "floor_plan"})
}

/// Creates a case-owned request of `request_type`.
pub async fn try_raise(
    services: &TestCasework,
    case_id: CaseId,
    request_type: RequestType,
    attributes: Value,
    actor: Actor,
) -> ValidationRequestServiceResult<ValidationRequest> {
    let input = CreateRequest::new(case_id, RequestOwner::Case(case_id), request_type)
        .with_attributes(attributes)
        .with_reason("Information is incorrect");
    services.requests().create(input, actor).await
}

/// Creates a case-owned request, failing the test on error.
pub async fn raise(
    services: &TestCasework,
    case_id: CaseId,
    request_type: RequestType,
    attributes: Value,
    actor: Actor,
) -> ValidationRequest {
    try_raise(services, case_id, request_type, attributes, actor)
        .await
        .expect("request should be created")
}
