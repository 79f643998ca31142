//! When steps for request lifecycle BDD scenarios.

use super::given::{create_input, parse_request_type};
use super::world::{RequestLifecycleWorld, run_async};
use casework::validation_request::domain::{Actor, ApplicantResponse};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"the applicant rejects the request because "{reason}""#)]
fn applicant_rejects(
    world: &mut RequestLifecycleWorld,
    reason: String,
) -> Result<(), eyre::Report> {
    let request_id = world.request()?.id();
    let result = run_async(world.casework.requests().respond(
        request_id,
        ApplicantResponse::Rejected { reason },
        Actor::Applicant,
    ));
    world.record(result);
    Ok(())
}

#[when(r#"the applicant answers the request with "{text}""#)]
fn applicant_answers(world: &mut RequestLifecycleWorld, text: String) -> Result<(), eyre::Report> {
    let request_id = world.request()?.id();
    let result = run_async(world.casework.requests().respond(
        request_id,
        ApplicantResponse::Responded { text },
        Actor::Applicant,
    ));
    world.record(result);
    Ok(())
}

#[when(r#"the officer raises another "{request_type}" request"#)]
fn officer_raises_another(
    world: &mut RequestLifecycleWorld,
    request_type: String,
) -> Result<(), eyre::Report> {
    let input = create_input(world, parse_request_type(&request_type)?)?;
    let result = run_async(world.casework.requests().create(input, world.officer));
    if let Err(err) = result {
        world.last_error = Some(err);
    }
    Ok(())
}

#[when(r#"the officer cancels the request because "{reason}""#)]
fn officer_cancels(world: &mut RequestLifecycleWorld, reason: String) -> Result<(), eyre::Report> {
    let request_id = world.request()?.id();
    let result = run_async(
        world
            .casework
            .requests()
            .cancel(request_id, &reason, world.officer),
    );
    world.record(result);
    Ok(())
}

#[when("the case enters assessment")]
fn case_enters_assessment(world: &mut RequestLifecycleWorld) -> Result<(), eyre::Report> {
    let case_id = world.case_id()?;
    let request_id = world.request()?.id();
    let (_, closed) = run_async(world.casework.mark_in_assessment(case_id))
        .wrap_err("record assessment milestone")?;
    if let Some(request) = closed.into_iter().find(|request| request.id() == request_id) {
        world.request = Some(request);
    }
    Ok(())
}
