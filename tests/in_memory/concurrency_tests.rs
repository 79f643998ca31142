//! Racing writers on the same request, case sequence and owner.

use super::helpers::{
    TestCasework, boundary_attributes, description_attributes, document_attributes, officer,
    open_planning_case, raise, services, try_raise,
};
use casework::case::domain::UserId;
use casework::error::ErrorKind;
use casework::validation_request::domain::{
    Actor, ApplicantResponse, RequestOwner, RequestSequence, RequestState, RequestType,
};
use casework::validation_request::services::EditRequest;
use rstest::rstest;
use std::collections::BTreeSet;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_responses_have_one_winner(services: TestCasework, officer: Actor) {
    let services = Arc::new(services);
    let case_id = open_planning_case(&services).await;
    let request = raise(
        &services,
        case_id,
        RequestType::DescriptionChange,
        description_attributes(),
        officer,
    )
    .await;
    services
        .requests()
        .dispatch(request.id(), officer)
        .await
        .expect("dispatch should succeed");

    let responses = [
        ApplicantResponse::Approved,
        ApplicantResponse::Rejected {
            reason: "The garage is not part of the proposal".to_owned(),
        },
    ];
    let handles: Vec<_> = responses
        .into_iter()
        .map(|response| {
            let service = Arc::clone(&services);
            let request_id = request.id();
            tokio::spawn(async move {
                service
                    .requests()
                    .respond(request_id, response, Actor::Applicant)
                    .await
            })
        })
        .collect();

    let mut winners = Vec::new();
    let mut losers = Vec::new();
    for handle in handles {
        match handle.await.expect("responder should not panic") {
            Ok(request) => winners.push(request),
            Err(err) => losers.push(err.kind()),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(losers, vec![ErrorKind::IllegalTransition]);
    let winner = winners.first().expect("one winner");
    let stored = services
        .requests()
        .find(request.id())
        .await
        .expect("lookup should succeed")
        .expect("request should exist");
    assert_eq!(stored.state(), RequestState::Closed);
    assert_eq!(stored.applicant_approved(), winner.applicant_approved());
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_unique_sequences(services: TestCasework, officer: Actor) {
    let services = Arc::new(services);
    let case_id = open_planning_case(&services).await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&services);
            tokio::spawn(async move {
                try_raise(
                    &service,
                    case_id,
                    RequestType::AdditionalDocument,
                    document_attributes(),
                    officer,
                )
                .await
            })
        })
        .collect();

    let mut sequences = BTreeSet::new();
    for handle in handles {
        let request = handle
            .await
            .expect("creator should not panic")
            .expect("create should succeed");
        sequences.insert(request.sequence());
    }

    let expected: BTreeSet<_> = (1..=4)
        .map(RequestSequence::new)
        .collect();
    assert_eq!(sequences, expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_single_instance_creates_admit_one(services: TestCasework, officer: Actor) {
    let services = Arc::new(services);
    let case_id = open_planning_case(&services).await;

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let service = Arc::clone(&services);
            tokio::spawn(async move {
                try_raise(
                    &service,
                    case_id,
                    RequestType::RedLineBoundaryChange,
                    boundary_attributes(),
                    officer,
                )
                .await
            })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("creator should not panic") {
            Ok(_) => created += 1,
            Err(err) if err.kind() == ErrorKind::Conflict => conflicts += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn milestone_racing_a_response_closes_the_request_once(
    services: TestCasework,
    officer: Actor,
) {
    let services = Arc::new(services);
    let case_id = open_planning_case(&services).await;
    let request = raise(
        &services,
        case_id,
        RequestType::DescriptionChange,
        description_attributes(),
        officer,
    )
    .await;
    services
        .requests()
        .dispatch(request.id(), officer)
        .await
        .expect("dispatch should succeed");

    let milestone = {
        let service = Arc::clone(&services);
        tokio::spawn(async move { service.mark_in_assessment(case_id).await })
    };
    let response = {
        let service = Arc::clone(&services);
        let request_id = request.id();
        tokio::spawn(async move {
            service
                .requests()
                .respond(request_id, ApplicantResponse::Approved, Actor::Applicant)
                .await
        })
    };

    let (_, closed) = milestone
        .await
        .expect("milestone should not panic")
        .expect("milestone should be recorded");
    let answered = response.await.expect("responder should not panic");

    let stored = services
        .requests()
        .find(request.id())
        .await
        .expect("lookup should succeed")
        .expect("request should exist");
    assert_eq!(stored.state(), RequestState::Closed);
    match answered {
        Ok(_) => {
            assert!(closed.is_empty());
            assert!(!stored.is_auto_closed());
            assert_eq!(stored.applicant_approved(), Some(true));
        }
        Err(err) => {
            assert_eq!(err.kind(), ErrorKind::IllegalTransition);
            assert_eq!(closed.len(), 1);
            assert!(stored.is_auto_closed());
        }
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn edit_racing_a_dispatch_is_never_lost(services: TestCasework, officer: Actor) {
    let services = Arc::new(services);
    let case_id = open_planning_case(&services).await;
    let request = raise(
        &services,
        case_id,
        RequestType::DescriptionChange,
        description_attributes(),
        officer,
    )
    .await;

    let edit = {
        let service = Arc::clone(&services);
        let request_id = request.id();
        tokio::spawn(async move {
            service
                .requests()
                .edit(
                    request_id,
                    EditRequest::new().with_reason("The description omits the garage"),
                    officer,
                )
                .await
        })
    };
    let dispatch = {
        let service = Arc::clone(&services);
        let request_id = request.id();
        tokio::spawn(async move { service.requests().dispatch(request_id, officer).await })
    };

    let edited = edit.await.expect("editor should not panic");
    let dispatched = dispatch.await.expect("dispatcher should not panic");

    let stored = services
        .requests()
        .find(request.id())
        .await
        .expect("lookup should succeed")
        .expect("request should exist");
    match edited {
        Ok(_) => assert_eq!(stored.reason(), Some("The description omits the garage")),
        Err(err) => assert_eq!(err.kind(), ErrorKind::IllegalTransition),
    }
    match dispatched {
        Ok(_) => assert_eq!(stored.state(), RequestState::Open),
        Err(err) => {
            assert_eq!(err.kind(), ErrorKind::IllegalTransition);
            assert_eq!(stored.state(), RequestState::Pending);
        }
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn assignment_racing_the_milestone_keeps_both(services: TestCasework) {
    let services = Arc::new(services);
    let case_id = open_planning_case(&services).await;
    let assignee = UserId::new();

    let milestone = {
        let service = Arc::clone(&services);
        tokio::spawn(async move { service.mark_in_assessment(case_id).await })
    };
    let assignment = {
        let service = Arc::clone(&services);
        tokio::spawn(async move { service.assign(case_id, assignee).await })
    };
    milestone
        .await
        .expect("milestone should not panic")
        .expect("milestone should be recorded");
    assignment
        .await
        .expect("assigner should not panic")
        .expect("assign should succeed");

    let stored = services
        .find(case_id)
        .await
        .expect("lookup should succeed")
        .expect("case should exist");
    assert!(stored.is_in_assessment());
    assert_eq!(stored.assigned_user(), Some(assignee));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn request_raised_during_the_milestone_is_not_left_open(
    services: TestCasework,
    officer: Actor,
) {
    let services = Arc::new(services);
    let case_id = open_planning_case(&services).await;

    let creates: Vec<_> = (0..3)
        .map(|_| {
            let service = Arc::clone(&services);
            tokio::spawn(async move {
                try_raise(
                    &service,
                    case_id,
                    RequestType::DescriptionChange,
                    description_attributes(),
                    officer,
                )
                .await
            })
        })
        .collect();
    let milestone = {
        let service = Arc::clone(&services);
        tokio::spawn(async move { service.mark_in_assessment(case_id).await })
    };

    milestone
        .await
        .expect("milestone should not panic")
        .expect("milestone should be recorded");
    for handle in creates {
        match handle.await.expect("creator should not panic") {
            Ok(_) => {}
            Err(err) => assert_eq!(err.kind(), ErrorKind::Conflict),
        }
    }

    let requests = services
        .requests_for(RequestOwner::Case(case_id), None)
        .await
        .expect("listing should succeed");
    assert!(!requests.is_empty());
    for request in requests {
        assert!(
            request.is_post_validation() || !request.state().is_unresolved(),
            "request {} raised before assessment is still {}",
            request.id(),
            request.state()
        );
    }
}
