//! Tree seeding, slug path resolution and sibling ordering.

use super::helpers::{TestCasework, init_tracing, open_planning_case, path, services};
use casework::case::domain::CaseId;
use casework::task_tree::{
    adapters::memory::InMemoryTaskTreeRepository,
    domain::{TaskParent, TaskSlug, TaskTemplate, TaskTemplateNode},
    services::{TaskTreeService, TaskTreeServiceError},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;

type TestTasks = TaskTreeService<InMemoryTaskTreeRepository, DefaultClock>;

#[fixture]
fn tasks() -> TestTasks {
    init_tracing();
    TaskTreeService::new(
        Arc::new(InMemoryTaskTreeRepository::new()),
        Arc::new(DefaultClock),
    )
}

fn slug(raw: &str) -> TaskSlug {
    TaskSlug::new(raw).expect("slug should parse")
}

/// Siblings listed out of position order.
fn shuffled_template() -> TaskTemplate {
    TaskTemplate::new([TaskTemplateNode::new("Assessment", slug("assessment"))
        .with_children([
            TaskTemplateNode::new("Write report", slug("write-report")).at_position(2),
            TaskTemplateNode::new("Check history", slug("check-history")),
            TaskTemplateNode::new("Add conditions", slug("add-conditions")).at_position(1),
        ])])
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolve_and_children_ignore_insertion_order(tasks: TestTasks) {
    let case_id = CaseId::new();
    tasks
        .build_tree(case_id, &shuffled_template())
        .await
        .expect("tree should build");

    let conditions = tasks
        .resolve(case_id, &path("assessment/add-conditions"))
        .await
        .expect("path should resolve");
    assert_eq!(conditions.slug(), &slug("add-conditions"));
    assert_eq!(conditions.position(), 1);

    let assessment = tasks
        .resolve(case_id, &path("assessment"))
        .await
        .expect("path should resolve");
    let children = tasks
        .children(TaskParent::Task(assessment.id()))
        .await
        .expect("children should load");
    let order: Vec<_> = children.iter().map(|task| task.slug().as_str()).collect();
    assert_eq!(order, vec!["check-history", "add-conditions", "write-report"]);
    assert_eq!(
        children.iter().map(|task| task.position()).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolve_names_the_first_missing_segment(tasks: TestTasks) {
    let case_id = CaseId::new();
    tasks
        .build_tree(case_id, &shuffled_template())
        .await
        .expect("tree should build");

    let err = tasks
        .resolve(case_id, &path("assessment/site-visit/photos"))
        .await
        .expect_err("path should not resolve");

    assert!(matches!(
        err,
        TaskTreeServiceError::PathNotFound { ref missing, .. }
            if *missing == path("assessment/site-visit")
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn opened_case_checklist_follows_template_order(services: TestCasework) {
    let case_id = open_planning_case(&services).await;

    let checklist = services
        .tasks()
        .checklist(case_id)
        .await
        .expect("checklist should load");

    let validation = checklist
        .first()
        .expect("checklist should not be empty");
    assert_eq!(validation.path, path("check-and-validate"));
    let sections: Vec<_> = validation
        .children
        .iter()
        .map(|node| node.slug.as_str())
        .collect();
    assert_eq!(
        sections,
        vec!["check-application-details", "check-documents", "review"]
    );
    let complete = services
        .tasks()
        .is_case_complete(case_id)
        .await
        .expect("completion should evaluate");
    assert!(!complete);
}
