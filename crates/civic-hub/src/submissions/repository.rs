use super::domain::{Submission, SubmissionId};
use super::filter::SubmissionFilter;

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Mutations of existing rows go through `modify`/`modify_pair`: the change runs while the
/// table is locked, against the record as currently stored.
pub trait SubmissionRepository: Send + Sync {
    /// Insert a new record; fails with [`RepositoryError::Conflict`] if the id exists.
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError>;

    /// Apply `change` to the stored record and persist the result.
    ///
    /// The stored record is left untouched when `change` or the write fails.
    fn modify<E, F>(&self, id: &SubmissionId, change: F) -> Result<Submission, E>
    where
        F: FnOnce(&mut Submission) -> Result<(), E>,
        E: From<RepositoryError>;

    /// Apply `change` to two stored records together. Either both writes land or neither does.
    fn modify_pair<E, F>(
        &self,
        first: &SubmissionId,
        second: &SubmissionId,
        change: F,
    ) -> Result<(Submission, Submission), E>
    where
        F: FnOnce(&mut Submission, &mut Submission) -> Result<(), E>,
        E: From<RepositoryError>;

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError>;
    /// Matching records, newest first.
    fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, RepositoryError>;

    fn all(&self) -> Result<Vec<Submission>, RepositoryError> {
        self.list(&SubmissionFilter::default())
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record {0} not found")]
    NotFound(SubmissionId),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
