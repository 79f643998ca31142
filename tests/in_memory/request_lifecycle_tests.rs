//! End-to-end request flows and their effect on bound tasks.

use super::helpers::{
    BOUNDARY_TASK, DESCRIPTION_TASK, DOCUMENTS_TASK, TestCasework, boundary_attributes,
    description_attributes, document_attributes, officer, open_planning_case, raise, services,
    set_task_status, task_at, try_raise,
};
use casework::error::ErrorKind;
use casework::task_tree::domain::TaskStatus;
use casework::validation_request::{
    domain::{
        Actor, ApplicantResponse, Milestone, RequestSequence, RequestState, RequestType,
        ValidationRequest,
    },
    services::ValidationRequestServiceError,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_description_change_flags_completed_task(
    services: TestCasework,
    officer: Actor,
) {
    let case_id = open_planning_case(&services).await;
    let request = raise(
        &services,
        case_id,
        RequestType::DescriptionChange,
        description_attributes(),
        officer,
    )
    .await;
    assert_eq!(request.state(), RequestState::Pending);
    set_task_status(&services, case_id, DESCRIPTION_TASK, TaskStatus::Completed).await;

    let sent = services
        .requests()
        .dispatch(request.id(), officer)
        .await
        .expect("dispatch should succeed");
    assert_eq!(sent.state(), RequestState::Open);
    assert!(sent.notified_at().is_some());

    let closed = services
        .requests()
        .respond(
            request.id(),
            ApplicantResponse::Rejected {
                reason: "too vague".to_owned(),
            },
            Actor::Applicant,
        )
        .await
        .expect("respond should succeed");

    assert_eq!(closed.state(), RequestState::Closed);
    assert_eq!(closed.applicant_approved(), Some(false));
    assert_eq!(closed.applicant_rejection_reason(), Some("too vague"));
    assert!(closed.closed_at().is_some());
    assert!(!closed.is_auto_closed());
    let task = task_at(&services, case_id, DESCRIPTION_TASK).await;
    assert_eq!(task.status(), TaskStatus::ActionRequired);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_unresolved_boundary_change_conflicts(services: TestCasework, officer: Actor) {
    let case_id = open_planning_case(&services).await;
    let first = raise(
        &services,
        case_id,
        RequestType::RedLineBoundaryChange,
        boundary_attributes(),
        officer,
    )
    .await;

    let err = try_raise(
        &services,
        case_id,
        RequestType::RedLineBoundaryChange,
        boundary_attributes(),
        officer,
    )
    .await
    .expect_err("second request should conflict");
    assert!(matches!(err, ValidationRequestServiceError::Conflict { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    services
        .requests()
        .cancel(first.id(), "boundary agreed by phone", officer)
        .await
        .expect("cancel should succeed");
    let replacement = raise(
        &services,
        case_id,
        RequestType::RedLineBoundaryChange,
        boundary_attributes(),
        officer,
    )
    .await;
    assert_eq!(replacement.state(), RequestState::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn auto_close_of_pending_request(services: TestCasework, officer: Actor) {
    let case_id = open_planning_case(&services).await;
    let request = raise(
        &services,
        case_id,
        RequestType::DescriptionChange,
        description_attributes(),
        officer,
    )
    .await;

    let closed = services
        .requests()
        .auto_close(request.id(), Milestone::EnteredAssessment, Actor::System)
        .await
        .expect("auto close should succeed");

    assert_eq!(closed.state(), RequestState::Closed);
    assert!(closed.is_auto_closed());
    assert!(closed.auto_closed_at().is_some());
    assert!(closed.applicant_approved().is_none());
    assert!(closed.notified_at().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_request_refuses_response_and_second_cancel(
    services: TestCasework,
    officer: Actor,
) {
    let case_id = open_planning_case(&services).await;
    let request = raise(
        &services,
        case_id,
        RequestType::AdditionalDocument,
        document_attributes(),
        officer,
    )
    .await;
    services
        .requests()
        .dispatch(request.id(), officer)
        .await
        .expect("dispatch should succeed");

    let cancelled = services
        .requests()
        .cancel(request.id(), "no longer needed", officer)
        .await
        .expect("cancel should succeed");
    assert_eq!(cancelled.state(), RequestState::Cancelled);
    assert_eq!(cancelled.cancel_reason(), Some("no longer needed"));

    let respond_err = services
        .requests()
        .respond(
            request.id(),
            ApplicantResponse::Responded {
                text: "Uploaded the floor plan".to_owned(),
            },
            Actor::Applicant,
        )
        .await
        .expect_err("respond should fail");
    assert_eq!(respond_err.kind(), ErrorKind::IllegalTransition);

    let cancel_err = services
        .requests()
        .cancel(request.id(), "again", officer)
        .await
        .expect_err("second cancel should fail");
    assert_eq!(cancel_err.kind(), ErrorKind::IllegalTransition);

    let stored = services
        .requests()
        .find(request.id())
        .await
        .expect("lookup should succeed")
        .expect("request should exist");
    assert_eq!(stored.cancelled_at(), cancelled.cancelled_at());
    assert_eq!(stored.cancel_reason(), Some("no longer needed"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pending_request_cannot_be_answered(services: TestCasework, officer: Actor) {
    let case_id = open_planning_case(&services).await;
    let request = raise(
        &services,
        case_id,
        RequestType::DescriptionChange,
        description_attributes(),
        officer,
    )
    .await;

    let err = services
        .requests()
        .respond(request.id(), ApplicantResponse::Approved, Actor::Applicant)
        .await
        .expect_err("respond should fail");

    assert_eq!(err.kind(), ErrorKind::IllegalTransition);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sequences_increase_across_request_types(services: TestCasework, officer: Actor) {
    let case_id = open_planning_case(&services).await;
    let mut sequences = Vec::new();
    for (request_type, attributes) in [
        (RequestType::DescriptionChange, description_attributes()),
        (RequestType::AdditionalDocument, document_attributes()),
        (RequestType::RedLineBoundaryChange, boundary_attributes()),
        (RequestType::AdditionalDocument, document_attributes()),
    ] {
        let request = raise(&services, case_id, request_type, attributes, officer).await;
        sequences.push(request.sequence());
    }

    let listed: Vec<RequestSequence> = services
        .requests()
        .list_for_case(case_id)
        .await
        .expect("list should succeed")
        .iter()
        .map(ValidationRequest::sequence)
        .collect();

    assert_eq!(sequences.first(), Some(&RequestSequence::FIRST));
    assert!(sequences.windows(2).all(|pair| pair.first() < pair.get(1)));
    assert_eq!(listed, sequences);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelling_one_document_request_keeps_shared_task_blocked(
    services: TestCasework,
    officer: Actor,
) {
    let case_id = open_planning_case(&services).await;
    let first = raise(
        &services,
        case_id,
        RequestType::AdditionalDocument,
        document_attributes(),
        officer,
    )
    .await;
    let second = raise(
        &services,
        case_id,
        RequestType::AdditionalDocument,
        document_attributes(),
        officer,
    )
    .await;
    assert_eq!(
        task_at(&services, case_id, DOCUMENTS_TASK).await.status(),
        TaskStatus::InProgress
    );

    services
        .requests()
        .cancel(first.id(), "duplicate", officer)
        .await
        .expect("cancel should succeed");
    assert_eq!(
        task_at(&services, case_id, DOCUMENTS_TASK).await.status(),
        TaskStatus::InProgress
    );

    services
        .requests()
        .cancel(second.id(), "supplied by email", officer)
        .await
        .expect("cancel should succeed");
    assert_eq!(
        task_at(&services, case_id, DOCUMENTS_TASK).await.status(),
        TaskStatus::NotStarted
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelling_never_regresses_a_completed_task(services: TestCasework, officer: Actor) {
    let case_id = open_planning_case(&services).await;
    let request = raise(
        &services,
        case_id,
        RequestType::RedLineBoundaryChange,
        boundary_attributes(),
        officer,
    )
    .await;
    set_task_status(&services, case_id, BOUNDARY_TASK, TaskStatus::Completed).await;

    services
        .requests()
        .cancel(request.id(), "withdrawn", officer)
        .await
        .expect("cancel should succeed");

    assert_eq!(
        task_at(&services, case_id, BOUNDARY_TASK).await.status(),
        TaskStatus::Completed
    );
}
