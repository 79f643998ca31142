//! Case milestones and consultation toggling across all three contexts.

use super::helpers::{
    BOUNDARY_TASK, DESCRIPTION_TASK, TestCasework, boundary_attributes, description_attributes,
    document_attributes, officer, open_planning_case, path, raise, services, task_at,
};
use casework::task_tree::domain::{ChecklistNode, TaskStatus};
use casework::validation_request::domain::{
    Actor, Milestone, RequestState, RequestType, ValidationRequest,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn entering_assessment_supersedes_only_pre_validation_changes(
    services: TestCasework,
    officer: Actor,
) {
    let case_id = open_planning_case(&services).await;
    let description = raise(
        &services,
        case_id,
        RequestType::DescriptionChange,
        description_attributes(),
        officer,
    )
    .await;
    let boundary = raise(
        &services,
        case_id,
        RequestType::RedLineBoundaryChange,
        boundary_attributes(),
        officer,
    )
    .await;
    services
        .requests()
        .dispatch(boundary.id(), officer)
        .await
        .expect("dispatch should succeed");
    let document = raise(
        &services,
        case_id,
        RequestType::AdditionalDocument,
        document_attributes(),
        officer,
    )
    .await;

    let (case, closed) = services
        .mark_in_assessment(case_id)
        .await
        .expect("milestone should be recorded");

    assert!(case.is_in_assessment());
    let mut closed_ids: Vec<_> = closed.iter().map(ValidationRequest::id).collect();
    closed_ids.sort_by_key(ToString::to_string);
    let mut expected = vec![description.id(), boundary.id()];
    expected.sort_by_key(ToString::to_string);
    assert_eq!(closed_ids, expected);
    assert!(closed.iter().all(|request| {
        request.is_auto_closed()
            && request.closing_milestone() == Some(Milestone::EnteredAssessment)
            && request.applicant_approved().is_none()
    }));

    let still_pending = services
        .requests()
        .find(document.id())
        .await
        .expect("lookup should succeed")
        .expect("request should exist");
    assert_eq!(still_pending.state(), RequestState::Pending);

    let post_validation = raise(
        &services,
        case_id,
        RequestType::DescriptionChange,
        description_attributes(),
        officer,
    )
    .await;
    assert!(post_validation.is_post_validation());
    let (_, reswept) = services
        .mark_in_assessment(case_id)
        .await
        .expect("repeat mark should succeed");
    assert!(reswept.is_empty());
    let untouched = services
        .requests()
        .find(post_validation.id())
        .await
        .expect("lookup should succeed")
        .expect("request should exist");
    assert_eq!(untouched.state(), RequestState::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn post_validation_requests_survive_milestone_sweeps(
    services: TestCasework,
    officer: Actor,
) {
    let case_id = open_planning_case(&services).await;
    services
        .mark_in_assessment(case_id)
        .await
        .expect("milestone should be recorded");
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
        .auto_close_for_milestone(case_id, Milestone::EnteredAssessment, Actor::System)
        .await
        .expect("sweep should succeed");

    assert!(closed.is_empty());
    let stored = services
        .requests()
        .find(request.id())
        .await
        .expect("lookup should succeed")
        .expect("request should exist");
    assert_eq!(stored.state(), RequestState::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn auto_closed_requests_leave_unfinished_tasks_alone(
    services: TestCasework,
    officer: Actor,
) {
    let case_id = open_planning_case(&services).await;
    raise(
        &services,
        case_id,
        RequestType::DescriptionChange,
        description_attributes(),
        officer,
    )
    .await;
    raise(
        &services,
        case_id,
        RequestType::RedLineBoundaryChange,
        boundary_attributes(),
        officer,
    )
    .await;

    services
        .mark_in_assessment(case_id)
        .await
        .expect("milestone should be recorded");

    for raw in [DESCRIPTION_TASK, BOUNDARY_TASK] {
        assert_eq!(
            task_at(&services, case_id, raw).await.status(),
            TaskStatus::InProgress
        );
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn consultation_subtree_is_revealed_on_demand(services: TestCasework) {
    let case_id = open_planning_case(&services).await;
    let visible_roots = |checklist: &[ChecklistNode]| {
        checklist
            .iter()
            .map(|node| node.path.to_string())
            .collect::<Vec<_>>()
    };

    let before = services
        .tasks()
        .checklist(case_id)
        .await
        .expect("checklist should load");
    assert!(!visible_roots(&before).contains(&"consultation".to_owned()));

    services
        .set_consultation_required(case_id, true)
        .await
        .expect("reveal should succeed");
    let during = services
        .tasks()
        .checklist(case_id)
        .await
        .expect("checklist should load");
    assert_eq!(
        visible_roots(&during),
        vec![
            "check-and-validate",
            "consultation",
            "assessment",
            "review-and-submit"
        ]
    );
    let consultees = task_at(&services, case_id, "consultation/select-consultees").await;
    assert!(!consultees.is_hidden());

    services
        .set_consultation_required(case_id, false)
        .await
        .expect("hide should succeed");
    let after = services
        .tasks()
        .checklist(case_id)
        .await
        .expect("checklist should load");
    assert_eq!(visible_roots(&after), visible_roots(&before));
    assert!(
        services
            .tasks()
            .resolve(case_id, &path("consultation"))
            .await
            .is_ok_and(|task| task.is_hidden())
    );
}
