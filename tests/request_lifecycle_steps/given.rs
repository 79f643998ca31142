//! Given steps for request lifecycle BDD scenarios.

use super::world::{RequestLifecycleWorld, run_async};
use casework::case::{
    domain::{CaseType, LocalAuthorityId},
    services::OpenCase,
};
use casework::task_tree::domain::{SlugPath, TaskStatus};
use casework::validation_request::{
    domain::{DocumentId, RequestOwner, RequestType},
    services::CreateRequest,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use serde_json::{Value, json};

/// Builds a valid payload for `request_type`.
pub fn attributes_for(request_type: RequestType) -> Value {
    match request_type {
        RequestType::DescriptionChange => json!({
            "proposed_description": "Single storey rear extension and garage conversion",
            "previous_description": "Rear extension",
        }),
        RequestType::RedLineBoundaryChange => json!({
            "new_geojson": {
                "type": "Polygon",
                "coordinates": [[[0.0, 51.0], [0.1, 51.0], [0.1, 51.1], [0.0, 51.0]]],
            },
        }),
        RequestType::AdditionalDocument => json!({"document_request_type": "floor_plan"}),
        RequestType::ReplacementDocument => json!({
            "document_request_type": "site_plan",
            "old_document_id": DocumentId::new(),
        }),
        RequestType::FeeChange => json!({"proposed_fee_pence": 25_800}),
        RequestType::OtherChange => Value::Null,
    }
}

/// Parses a request type named in a scenario.
///
/// # Errors
///
/// Returns an error for unknown request types.
pub fn parse_request_type(raw: &str) -> Result<RequestType, eyre::Report> {
    RequestType::try_from(raw).map_err(|err| eyre::eyre!("invalid request type in scenario: {err}"))
}

/// Builds a case-owned create input for `request_type`.
pub fn create_input(
    world: &RequestLifecycleWorld,
    request_type: RequestType,
) -> Result<CreateRequest, eyre::Report> {
    let case_id = world.case_id()?;
    Ok(
        CreateRequest::new(case_id, RequestOwner::Case(case_id), request_type)
            .with_attributes(attributes_for(request_type))
            .with_reason("Raised during validation"),
    )
}

#[given("an open planning application case")]
fn open_planning_case(world: &mut RequestLifecycleWorld) -> Result<(), eyre::Report> {
    let case = run_async(world.casework.open(OpenCase {
        case_type: CaseType::PlanningApplication,
        local_authority: LocalAuthorityId::new(),
        submission: None,
    }))
    .wrap_err("open case for scenario")?;
    world.case_id = Some(case.id());
    Ok(())
}

#[given(r#"the "{path}" task is "{status}""#)]
fn task_has_status(
    world: &mut RequestLifecycleWorld,
    path: String,
    status: String,
) -> Result<(), eyre::Report> {
    let case_id = world.case_id()?;
    let slug_path =
        SlugPath::parse(&path).map_err(|err| eyre::eyre!("invalid path in scenario: {err}"))?;
    let target = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let task = run_async(world.casework.tasks().resolve(case_id, &slug_path))
        .wrap_err("resolve task for scenario setup")?;
    run_async(world.casework.tasks().set_status(task.id(), target))
        .wrap_err("set task status for scenario setup")?;
    Ok(())
}

#[given(r#"a "{request_type}" request has been raised"#)]
fn request_raised(
    world: &mut RequestLifecycleWorld,
    request_type: String,
) -> Result<(), eyre::Report> {
    let input = create_input(world, parse_request_type(&request_type)?)?;
    let created = run_async(world.casework.requests().create(input, world.officer))
        .wrap_err("create request for scenario setup")?;
    world.request = Some(created);
    Ok(())
}

#[given("the request has been sent to the applicant")]
fn request_sent(world: &mut RequestLifecycleWorld) -> Result<(), eyre::Report> {
    let request_id = world.request()?.id();
    let sent = run_async(world.casework.requests().dispatch(request_id, world.officer))
        .wrap_err("dispatch request for scenario setup")?;
    world.request = Some(sent);
    Ok(())
}
