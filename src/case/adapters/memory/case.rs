//! In-memory repository for case records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::case::{
    domain::{CaseChange, CaseId, CaseRecord},
    ports::{CaseRepository, CaseRepositoryError, CaseRepositoryResult},
};

/// Thread-safe in-memory case repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCaseRepository {
    cases: Arc<RwLock<HashMap<CaseId, CaseRecord>>>,
}

impl InMemoryCaseRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> CaseRepositoryError {
    CaseRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn store(&self, case: &CaseRecord) -> CaseRepositoryResult<()> {
        let mut cases = self.cases.write().map_err(poisoned)?;
        if cases.contains_key(&case.id()) {
            return Err(CaseRepositoryError::DuplicateCase(case.id()));
        }
        cases.insert(case.id(), case.clone());
        Ok(())
    }

    async fn apply(
        &self,
        case_id: CaseId,
        change: CaseChange,
        at: DateTime<Utc>,
    ) -> CaseRepositoryResult<CaseRecord> {
        let mut cases = self.cases.write().map_err(poisoned)?;
        let stored = cases
            .get_mut(&case_id)
            .ok_or(CaseRepositoryError::NotFound(case_id))?;
        stored
            .apply(change, at)
            .map_err(CaseRepositoryError::Rejected)?;
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: CaseId) -> CaseRepositoryResult<Option<CaseRecord>> {
        let cases = self.cases.read().map_err(poisoned)?;
        Ok(cases.get(&id).cloned())
    }
}
