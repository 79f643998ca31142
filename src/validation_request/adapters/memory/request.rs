//! In-memory repository for validation requests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::case::domain::CaseId;
use crate::validation_request::{
    domain::{RequestId, RequestOwner, RequestSequence, RequestType, ValidationRequest},
    ports::{
        RequestVersion, ValidationRequestRepository, ValidationRequestRepositoryError,
        ValidationRequestRepositoryResult,
    },
};

/// Thread-safe in-memory validation request repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryValidationRequestRepository {
    state: Arc<RwLock<InMemoryRequestState>>,
}

#[derive(Debug, Default)]
struct InMemoryRequestState {
    requests: HashMap<RequestId, ValidationRequest>,
    sequence_index: HashMap<CaseId, BTreeMap<RequestSequence, RequestId>>,
}

impl InMemoryValidationRequestRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> ValidationRequestRepositoryError {
    ValidationRequestRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn by_sequence<'a>(
    state: &'a InMemoryRequestState,
    case_id: CaseId,
) -> impl Iterator<Item = &'a ValidationRequest> + 'a {
    state
        .sequence_index
        .get(&case_id)
        .into_iter()
        .flat_map(|sequences| sequences.values())
        .filter_map(|id| state.requests.get(id))
}

#[async_trait]
impl ValidationRequestRepository for InMemoryValidationRequestRepository {
    async fn store(&self, request: &ValidationRequest) -> ValidationRequestRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.requests.contains_key(&request.id()) {
            return Err(ValidationRequestRepositoryError::DuplicateRequest(
                request.id(),
            ));
        }

        let case_id = request.case_id();
        let sequence = request.sequence();
        let sequence_taken = state
            .sequence_index
            .get(&case_id)
            .is_some_and(|sequences| sequences.contains_key(&sequence));
        if sequence_taken {
            return Err(ValidationRequestRepositoryError::DuplicateSequence { case_id, sequence });
        }

        let request_type = request.request_type();
        if !request_type.is_multi_instance() {
            let owner = request.owner();
            let unresolved_exists = by_sequence(&state, case_id).any(|existing| {
                existing.owner() == owner
                    && existing.request_type() == request_type
                    && existing.state().is_unresolved()
            });
            if unresolved_exists {
                return Err(ValidationRequestRepositoryError::UnresolvedRequestExists {
                    owner,
                    request_type,
                });
            }
        }

        state
            .sequence_index
            .entry(case_id)
            .or_default()
            .insert(sequence, request.id());
        state.requests.insert(request.id(), request.clone());
        Ok(())
    }

    async fn update_if_unchanged(
        &self,
        request: &ValidationRequest,
        loaded: RequestVersion,
    ) -> ValidationRequestRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let stored = state
            .requests
            .get_mut(&request.id())
            .ok_or(ValidationRequestRepositoryError::NotFound(request.id()))?;
        if stored.state() != loaded.state {
            return Err(ValidationRequestRepositoryError::StaleState {
                request_id: request.id(),
                expected: loaded.state,
                actual: stored.state(),
            });
        }
        if stored.updated_at() != loaded.updated_at {
            return Err(ValidationRequestRepositoryError::Modified(request.id()));
        }
        *stored = request.clone();
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: RequestId,
    ) -> ValidationRequestRepositoryResult<Option<ValidationRequest>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.requests.get(&id).cloned())
    }

    async fn list_for_case(
        &self,
        case_id: CaseId,
    ) -> ValidationRequestRepositoryResult<Vec<ValidationRequest>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(by_sequence(&state, case_id).cloned().collect())
    }

    async fn list_for_owner(
        &self,
        owner: RequestOwner,
        request_type: Option<RequestType>,
    ) -> ValidationRequestRepositoryResult<Vec<ValidationRequest>> {
        let state = self.state.read().map_err(poisoned)?;
        let mut matching: Vec<ValidationRequest> = state
            .requests
            .values()
            .filter(|request| request.owner() == owner)
            .filter(|request| request_type.is_none_or(|wanted| request.request_type() == wanted))
            .cloned()
            .collect();
        matching.sort_by_key(|request| (request.case_id(), request.sequence()));
        Ok(matching)
    }

    async fn next_sequence(
        &self,
        case_id: CaseId,
    ) -> ValidationRequestRepositoryResult<RequestSequence> {
        let state = self.state.read().map_err(poisoned)?;
        let next = state
            .sequence_index
            .get(&case_id)
            .and_then(|sequences| sequences.keys().next_back())
            .map_or(RequestSequence::FIRST, |last| last.next());
        Ok(next)
    }
}
