//! Tests for the task tree service.

use crate::case::domain::CaseId;
use crate::error::ErrorKind;
use crate::task_tree::{
    adapters::memory::InMemoryTaskTreeRepository,
    domain::{SlugPath, Task, TaskParent, TaskSlug, TaskStatus, TaskTemplate, TaskTemplateNode},
    ports::TaskTreeRepositoryError,
    services::{TaskTreeService, TaskTreeServiceError},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;

type TestService = TaskTreeService<InMemoryTaskTreeRepository, DefaultClock>;

const DETAILS_PATH: &str = "check-and-validate/check-application-details";
const DESCRIPTION_PATH: &str = "check-and-validate/check-application-details/check-description";
const FEE_PATH: &str = "check-and-validate/check-application-details/check-fee";

#[fixture]
fn service() -> TestService {
    TaskTreeService::new(
        Arc::new(InMemoryTaskTreeRepository::new()),
        Arc::new(DefaultClock),
    )
}

fn slug(raw: &str) -> TaskSlug {
    TaskSlug::new(raw).expect("slug should parse")
}

fn path(raw: &str) -> SlugPath {
    SlugPath::parse(raw).expect("path should parse")
}

fn template() -> TaskTemplate {
    TaskTemplate::new([
        TaskTemplateNode::new("Check and validate", slug("check-and-validate")).with_children([
            TaskTemplateNode::new("Check application details", slug("check-application-details"))
                .with_children([
                    TaskTemplateNode::new("Check description", slug("check-description")),
                    TaskTemplateNode::new("Check fee", slug("check-fee")).at_position(1),
                ]),
        ]),
        TaskTemplateNode::new("Consultation", slug("consultation"))
            .at_position(1)
            .hidden(),
    ])
}

async fn seeded(service: &TestService) -> CaseId {
    let case_id = CaseId::new();
    service
        .build_tree(case_id, &template())
        .await
        .expect("tree should build");
    case_id
}

async fn resolve(service: &TestService, case_id: CaseId, raw: &str) -> Task {
    service
        .resolve(case_id, &path(raw))
        .await
        .expect("path should resolve")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn build_tree_stores_every_template_node(service: TestService) {
    let case_id = CaseId::new();

    let tasks = service
        .build_tree(case_id, &template())
        .await
        .expect("tree should build");

    assert_eq!(tasks.len(), 5);
    let top = service
        .children(TaskParent::Case(case_id))
        .await
        .expect("children should load");
    let slugs: Vec<&str> = top.iter().map(|task| task.slug().as_str()).collect();
    assert_eq!(slugs, vec!["check-and-validate", "consultation"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn build_tree_rejects_invalid_templates(service: TestService) {
    let err = service
        .build_tree(CaseId::new(), &TaskTemplate::default())
        .await
        .expect_err("empty template should fail");

    assert_eq!(err.kind(), ErrorKind::SchemaValidation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn building_twice_conflicts(service: TestService) {
    let case_id = seeded(&service).await;

    let err = service
        .build_tree(case_id, &template())
        .await
        .expect_err("second tree should conflict");

    assert!(matches!(
        err,
        TaskTreeServiceError::Repository(TaskTreeRepositoryError::DuplicateSibling { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolve_walks_nested_paths(service: TestService) {
    let case_id = seeded(&service).await;

    let task = resolve(&service, case_id, FEE_PATH).await;

    assert_eq!(task.name(), "Check fee");
    assert_eq!(task.case_id(), case_id);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolve_names_first_missing_segment(service: TestService) {
    let case_id = seeded(&service).await;

    let err = service
        .resolve(case_id, &path("check-and-validate/check-documents/check-plans"))
        .await
        .expect_err("path should not resolve");

    let TaskTreeServiceError::PathNotFound { missing, .. } = &err else {
        panic!("expected a path-not-found error, got {err:?}");
    };
    assert_eq!(missing.to_string(), "check-and-validate/check-documents");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolve_is_scoped_to_the_case(service: TestService) {
    seeded(&service).await;

    let err = service
        .resolve(CaseId::new(), &path("check-and-validate"))
        .await
        .expect_err("other case has no tree");

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn set_status_writes_only_the_target(service: TestService) {
    let case_id = seeded(&service).await;
    let fee = resolve(&service, case_id, FEE_PATH).await;

    let updated = service
        .set_status(fee.id(), TaskStatus::Completed)
        .await
        .expect("status should update");

    assert_eq!(updated.status(), TaskStatus::Completed);
    let parent = resolve(&service, case_id, DETAILS_PATH).await;
    assert_eq!(parent.status(), TaskStatus::NotStarted);
    let rolled_up = service
        .rollup_status(parent.id())
        .await
        .expect("rollup should succeed");
    assert_eq!(rolled_up, TaskStatus::InProgress);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn set_status_of_unknown_task_is_not_found(service: TestService) {
    let err = service
        .set_status(crate::task_tree::domain::TaskId::new(), TaskStatus::Completed)
        .await
        .expect_err("unknown task should fail");

    assert!(matches!(err, TaskTreeServiceError::NotFound(_)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn request_reactions_follow_status_rules(service: TestService) {
    let case_id = seeded(&service).await;
    let description = resolve(&service, case_id, DESCRIPTION_PATH).await;

    let raised = service
        .react_to_request_raised(description.id())
        .await
        .expect("reaction should succeed");
    assert_eq!(raised.status(), TaskStatus::InProgress);

    let closed_in_progress = service
        .react_to_request_closed(description.id(), Some(true))
        .await
        .expect("reaction should succeed");
    assert_eq!(closed_in_progress.status(), TaskStatus::InProgress);

    service
        .set_status(description.id(), TaskStatus::Completed)
        .await
        .expect("status should update");
    let reopened = service
        .react_to_request_closed(description.id(), Some(false))
        .await
        .expect("reaction should succeed");
    assert_eq!(reopened.status(), TaskStatus::ActionRequired);

    let kept = service
        .react_to_request_cancelled(description.id())
        .await
        .expect("reaction should succeed");
    assert_eq!(kept.status(), TaskStatus::ActionRequired);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_only_undoes_a_start_made_by_a_raise(service: TestService) {
    let case_id = seeded(&service).await;
    let description = resolve(&service, case_id, DESCRIPTION_PATH).await;
    let fee = resolve(&service, case_id, FEE_PATH).await;

    service
        .react_to_request_raised(description.id())
        .await
        .expect("reaction should succeed");
    let reset = service
        .react_to_request_cancelled(description.id())
        .await
        .expect("reaction should succeed");
    assert_eq!(reset.status(), TaskStatus::NotStarted);

    service
        .set_status(fee.id(), TaskStatus::InProgress)
        .await
        .expect("status should update");
    service
        .react_to_request_raised(fee.id())
        .await
        .expect("reaction should succeed");
    let kept = service
        .react_to_request_cancelled(fee.id())
        .await
        .expect("reaction should succeed");
    assert_eq!(kept.status(), TaskStatus::InProgress);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn raised_request_leaves_completed_task(service: TestService) {
    let case_id = seeded(&service).await;
    let fee = resolve(&service, case_id, FEE_PATH).await;
    service
        .set_status(fee.id(), TaskStatus::Completed)
        .await
        .expect("status should update");

    let unchanged = service
        .react_to_request_raised(fee.id())
        .await
        .expect("reaction should succeed");

    assert_eq!(unchanged.status(), TaskStatus::Completed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reveal_and_hide_keep_status(service: TestService) {
    let case_id = seeded(&service).await;
    let consultation = resolve(&service, case_id, "consultation").await;
    assert!(consultation.is_hidden());

    let revealed = service
        .reveal(consultation.id())
        .await
        .expect("reveal should succeed");
    assert!(!revealed.is_hidden());
    service
        .set_status(consultation.id(), TaskStatus::InProgress)
        .await
        .expect("status should update");

    let hidden = service
        .hide(consultation.id())
        .await
        .expect("hide should succeed");

    assert!(hidden.is_hidden());
    assert_eq!(hidden.status(), TaskStatus::InProgress);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn checklist_reflects_visibility(service: TestService) {
    let case_id = seeded(&service).await;
    let consultation = resolve(&service, case_id, "consultation").await;

    let before = service.checklist(case_id).await.expect("checklist should build");
    service
        .reveal(consultation.id())
        .await
        .expect("reveal should succeed");
    let after = service.checklist(case_id).await.expect("checklist should build");

    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn case_completes_when_required_leaves_complete(service: TestService) {
    let case_id = seeded(&service).await;
    let initially_complete = service
        .is_case_complete(case_id)
        .await
        .expect("completion should evaluate");
    assert!(!initially_complete);

    for leaf in [DESCRIPTION_PATH, FEE_PATH] {
        let task = resolve(&service, case_id, leaf).await;
        service
            .set_status(task.id(), TaskStatus::Completed)
            .await
            .expect("status should update");
    }

    let finally_complete = service
        .is_case_complete(case_id)
        .await
        .expect("completion should evaluate");
    assert!(finally_complete);
}
