use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::cache::{CachedQuery, Mutation, QueryCache, QueryKey};
use super::domain::{NewSubmission, Submission, SubmissionId, SubmissionPatch};
use super::filter::SubmissionFilter;
use super::matching::{self, CategoryMismatch, MatchSuggestion, MatchedPair};
use super::repository::{RepositoryError, SubmissionRepository};
use super::stats::DashboardStats;
use super::validation::{IntakeGuard, ValidationError};

/// Source of "now" for timestamps, swappable in tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Service composing intake validation, the repository, and the query cache.
pub struct SubmissionService<R> {
    guard: IntakeGuard,
    repository: Arc<R>,
    cache: QueryCache,
    clock: Clock,
}

impl<R> SubmissionService<R>
where
    R: SubmissionRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_cache(repository, QueryCache::default())
    }

    pub fn with_cache(repository: Arc<R>, cache: QueryCache) -> Self {
        Self {
            guard: IntakeGuard::default(),
            repository,
            cache,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Submissions matching `filter`, newest first.
    pub fn list(&self, filter: SubmissionFilter) -> Result<Vec<Submission>, SubmissionServiceError> {
        self.cache.get_or_fetch(
            QueryKey::Submissions(filter),
            |cached| match cached {
                CachedQuery::Submissions(rows) => Some(rows.clone()),
                _ => None,
            },
            |rows| CachedQuery::Submissions(rows.clone()),
            || Ok(self.repository.list(&filter)?),
        )
    }

    pub fn get(&self, id: &SubmissionId) -> Result<Submission, SubmissionServiceError> {
        self.cache.get_or_fetch(
            QueryKey::Submission(id.clone()),
            |cached| match cached {
                CachedQuery::Submission(found) => Some(found.clone()),
                _ => None,
            },
            |found| CachedQuery::Submission(found.clone()),
            || self.fetch_existing(id),
        )
    }

    fn fetch_existing(&self, id: &SubmissionId) -> Result<Submission, SubmissionServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| SubmissionServiceError::NotFound(id.clone()))
    }

    /// Validate and store a new submission. Status defaults to `open`.
    pub fn create(&self, input: NewSubmission) -> Result<Submission, SubmissionServiceError> {
        let record = self
            .guard
            .submission_from_intake(input, SubmissionId::generate(), self.now())?;
        let stored = self.repository.insert(record)?;
        self.cache.invalidate(&Mutation::Create);

        info!(
            id = %stored.id,
            category = stored.category.label(),
            "submission created"
        );
        Ok(stored)
    }

    /// Apply a partial update. Validation runs before the repository is touched, and the
    /// patch is applied to the record as stored at write time.
    pub fn update(
        &self,
        id: &SubmissionId,
        patch: SubmissionPatch,
    ) -> Result<Submission, SubmissionServiceError> {
        let patch = self.guard.check_patch(patch)?;
        let now = self.now();
        let stored = self.repository.modify(id, |record| {
            patch.apply_to(record, now);
            Ok::<(), SubmissionServiceError>(())
        })?;
        self.cache.invalidate(&Mutation::Update(id.clone()));

        info!(id = %stored.id, status = stored.status.label(), "submission updated");
        Ok(stored)
    }

    /// Pair a need with an offer; both records are checked and written under one lock.
    pub fn confirm_match(
        &self,
        need_id: &SubmissionId,
        offer_id: &SubmissionId,
    ) -> Result<MatchedPair, SubmissionServiceError> {
        let now = self.now();
        let (need, offer) = self.repository.modify_pair(need_id, offer_id, |need, offer| {
            matching::pair(need, offer, now).map_err(SubmissionServiceError::from)
        })?;
        self.cache.invalidate(&Mutation::Match {
            need: need_id.clone(),
            offer: offer_id.clone(),
        });

        info!(need = %need.id, offer = %offer.id, "match confirmed");
        Ok(MatchedPair { need, offer })
    }

    pub fn stats(&self) -> Result<DashboardStats, SubmissionServiceError> {
        self.cache.get_or_fetch(
            QueryKey::Stats,
            |cached| match cached {
                CachedQuery::Stats(stats) => Some(*stats),
                _ => None,
            },
            |stats| CachedQuery::Stats(*stats),
            || {
                let all = self.repository.all()?;
                Ok(DashboardStats::from_submissions(&all))
            },
        )
    }

    pub fn match_suggestions(&self) -> Result<Vec<MatchSuggestion>, SubmissionServiceError> {
        self.cache.get_or_fetch(
            QueryKey::MatchSuggestions,
            |cached| match cached {
                CachedQuery::MatchSuggestions(suggestions) => Some(suggestions.clone()),
                _ => None,
            },
            |suggestions| CachedQuery::MatchSuggestions(suggestions.clone()),
            || {
                let all = self.repository.all()?;
                Ok(matching::suggest_matches(&all))
            },
        )
    }
}

/// Error raised by the submission service.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("submission {0} not found")]
    NotFound(SubmissionId),
    #[error(transparent)]
    InvalidPair(#[from] CategoryMismatch),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for SubmissionServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            other => Self::Repository(other),
        }
    }
}
