use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Barrier};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::submissions::domain::{
    Category, Neighborhood, NewSubmission, Submission, SubmissionId, SubmissionStatus,
};
use crate::submissions::filter::SubmissionFilter;
use crate::submissions::repository::{RepositoryError, SubmissionRepository};
use crate::submissions::service::{Clock, SubmissionService};
use crate::submissions::store::InMemorySubmissionRepository;
use crate::submissions::submission_router;

/// A fixed morning plus `minute` minutes.
pub(crate) fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 12, 8, 0, 0)
        .single()
        .expect("valid time")
        + chrono::Duration::minutes(i64::from(minute))
}

pub(crate) fn submission(id: &str, category: Category, created_at: DateTime<Utc>) -> Submission {
    Submission {
        id: SubmissionId::from(id),
        category,
        status: SubmissionStatus::Open,
        title: format!("{} {id}", category.label()),
        description: "Placeholder description for fixtures".to_string(),
        neighborhood: None,
        contact_name: None,
        contact_email: None,
        hours_offered: None,
        matched_with_id: None,
        created_at,
        updated_at: created_at,
    }
}

pub(crate) fn intake(category: Category) -> NewSubmission {
    NewSubmission {
        category,
        status: None,
        title: "Grocery runs".to_string(),
        description: "Weekly grocery pickup for a neighbor".to_string(),
        neighborhood: Some(Neighborhood::Downtown),
        contact_name: Some("Jordan".to_string()),
        contact_email: Some("jordan@example.org".to_string()),
        hours_offered: None,
    }
}

/// Clock that advances one minute per call so creation order is observable.
pub(crate) fn stepping_clock() -> Clock {
    let tick = Arc::new(AtomicU32::new(0));
    Arc::new(move || at(tick.fetch_add(1, Ordering::Relaxed)))
}

pub(crate) fn build_service() -> (
    SubmissionService<InMemorySubmissionRepository>,
    Arc<InMemorySubmissionRepository>,
) {
    let repository = Arc::new(InMemorySubmissionRepository::default());
    let service = SubmissionService::new(repository.clone()).with_clock(stepping_clock());
    (service, repository)
}

pub(crate) fn router_with_service(
    service: SubmissionService<InMemorySubmissionRepository>,
) -> axum::Router {
    submission_router(Arc::new(service))
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(crate) struct UnavailableRepository;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

impl SubmissionRepository for UnavailableRepository {
    fn insert(&self, _submission: Submission) -> Result<Submission, RepositoryError> {
        Err(offline())
    }

    fn modify<E, F>(&self, _id: &SubmissionId, _change: F) -> Result<Submission, E>
    where
        F: FnOnce(&mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        Err(offline().into())
    }

    fn modify_pair<E, F>(
        &self,
        _first: &SubmissionId,
        _second: &SubmissionId,
        _change: F,
    ) -> Result<(Submission, Submission), E>
    where
        F: FnOnce(&mut Submission, &mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        Err(offline().into())
    }

    fn fetch(&self, _id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        Err(offline())
    }

    fn list(&self, _filter: &SubmissionFilter) -> Result<Vec<Submission>, RepositoryError> {
        Err(offline())
    }
}

/// Reads work; the paired write always fails.
#[derive(Default)]
pub(crate) struct PairFailingRepository {
    pub(crate) inner: InMemorySubmissionRepository,
}

impl SubmissionRepository for PairFailingRepository {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        self.inner.insert(submission)
    }

    fn modify<E, F>(&self, id: &SubmissionId, change: F) -> Result<Submission, E>
    where
        F: FnOnce(&mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        self.inner.modify(id, change)
    }

    fn modify_pair<E, F>(
        &self,
        _first: &SubmissionId,
        _second: &SubmissionId,
        _change: F,
    ) -> Result<(Submission, Submission), E>
    where
        F: FnOnce(&mut Submission, &mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("write timed out".to_string()).into())
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, RepositoryError> {
        self.inner.list(filter)
    }
}

/// Once armed, the next `list` call reads its rows and then parks until the test thread
/// has passed both barriers.
pub(crate) struct GatedRepository {
    pub(crate) inner: InMemorySubmissionRepository,
    pub(crate) armed: AtomicBool,
    pub(crate) reached: Barrier,
    pub(crate) release: Barrier,
}

impl Default for GatedRepository {
    fn default() -> Self {
        Self {
            inner: InMemorySubmissionRepository::default(),
            armed: AtomicBool::new(false),
            reached: Barrier::new(2),
            release: Barrier::new(2),
        }
    }
}

impl SubmissionRepository for GatedRepository {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        self.inner.insert(submission)
    }

    fn modify<E, F>(&self, id: &SubmissionId, change: F) -> Result<Submission, E>
    where
        F: FnOnce(&mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        self.inner.modify(id, change)
    }

    fn modify_pair<E, F>(
        &self,
        first: &SubmissionId,
        second: &SubmissionId,
        change: F,
    ) -> Result<(Submission, Submission), E>
    where
        F: FnOnce(&mut Submission, &mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        self.inner.modify_pair(first, second, change)
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, RepositoryError> {
        let rows = self.inner.list(filter)?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.wait();
            self.release.wait();
        }
        Ok(rows)
    }
}
