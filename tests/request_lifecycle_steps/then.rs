//! Then steps for request lifecycle BDD scenarios.

use super::world::{RequestLifecycleWorld, run_async};
use casework::task_tree::domain::{SlugPath, TaskStatus};
use casework::validation_request::domain::{Milestone, RequestState};
use eyre::WrapErr;
use rstest_bdd_macros::then;

#[then(r#"the request state is "{state}""#)]
fn request_state_is(world: &RequestLifecycleWorld, state: String) -> Result<(), eyre::Report> {
    let expected = RequestState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected state in scenario: {err}"))?;
    let request = world.request()?;

    if request.state() != expected {
        return Err(eyre::eyre!(
            "expected state {}, found {}",
            expected.as_str(),
            request.state().as_str()
        ));
    }
    Ok(())
}

#[then("the request is recorded as rejected by the applicant")]
fn request_rejected(world: &RequestLifecycleWorld) -> Result<(), eyre::Report> {
    let request = world.request()?;

    if request.applicant_approved() != Some(false) || request.closed_at().is_none() {
        return Err(eyre::eyre!(
            "expected a closed rejection, got approval {:?} closed at {:?}",
            request.applicant_approved(),
            request.closed_at()
        ));
    }
    Ok(())
}

#[then("the request was closed automatically")]
fn request_auto_closed(world: &RequestLifecycleWorld) -> Result<(), eyre::Report> {
    let request = world.request()?;

    if !request.is_auto_closed()
        || request.auto_closed_at().is_none()
        || request.closing_milestone() != Some(Milestone::EnteredAssessment)
    {
        return Err(eyre::eyre!("expected an auto-closed request, got {request:?}"));
    }
    Ok(())
}

#[then("no applicant decision is recorded")]
fn no_applicant_decision(world: &RequestLifecycleWorld) -> Result<(), eyre::Report> {
    let request = world.request()?;

    if let Some(approved) = request.applicant_approved() {
        return Err(eyre::eyre!("expected no decision, found {approved}"));
    }
    Ok(())
}

#[then(r#"the last action is refused as "{kind}""#)]
fn last_action_refused(world: &RequestLifecycleWorld, kind: String) -> Result<(), eyre::Report> {
    let err = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected the last action to fail"))?;

    if err.kind().as_str() != kind {
        return Err(eyre::eyre!(
            "expected a {kind} error, got {} ({err})",
            err.kind()
        ));
    }
    Ok(())
}

#[then(r#"the "{path}" task is "{status}""#)]
fn task_status_is(
    world: &RequestLifecycleWorld,
    path: String,
    status: String,
) -> Result<(), eyre::Report> {
    let case_id = world.case_id()?;
    let slug_path =
        SlugPath::parse(&path).map_err(|err| eyre::eyre!("invalid path in scenario: {err}"))?;
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let task = run_async(world.casework.tasks().resolve(case_id, &slug_path))
        .wrap_err("resolve task for assertion")?;

    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected {path} to be {expected}, found {}",
            task.status()
        ));
    }
    Ok(())
}
