use civic_hub::config::StorageConfig;
use civic_hub::submissions::{
    InMemorySubmissionRepository, JsonFileSubmissionRepository, QueryCache, RepositoryError,
    Submission, SubmissionFilter, SubmissionId, SubmissionRepository, SubmissionService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Repository backend chosen at startup.
pub(crate) enum Storage {
    Memory(InMemorySubmissionRepository),
    File(JsonFileSubmissionRepository),
}

impl Storage {
    pub(crate) fn open(data_path: Option<PathBuf>) -> Result<Self, RepositoryError> {
        match data_path {
            Some(path) => Ok(Self::File(JsonFileSubmissionRepository::open(path)?)),
            None => Ok(Self::Memory(InMemorySubmissionRepository::default())),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Storage::Memory(_) => "memory".to_string(),
            Storage::File(repository) => repository.path().display().to_string(),
        }
    }
}

impl SubmissionRepository for Storage {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        match self {
            Storage::Memory(repository) => repository.insert(submission),
            Storage::File(repository) => repository.insert(submission),
        }
    }

    fn modify<E, F>(&self, id: &SubmissionId, change: F) -> Result<Submission, E>
    where
        F: FnOnce(&mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        match self {
            Storage::Memory(repository) => repository.modify(id, change),
            Storage::File(repository) => repository.modify(id, change),
        }
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
        match self {
            Storage::Memory(repository) => repository.modify_pair(first, second, change),
            Storage::File(repository) => repository.modify_pair(first, second, change),
        }
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        match self {
            Storage::Memory(repository) => repository.fetch(id),
            Storage::File(repository) => repository.fetch(id),
        }
    }

    fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, RepositoryError> {
        match self {
            Storage::Memory(repository) => repository.list(filter),
            Storage::File(repository) => repository.list(filter),
        }
    }
}

pub(crate) fn build_service(
    config: &StorageConfig,
) -> Result<SubmissionService<Storage>, RepositoryError> {
    let storage = Storage::open(config.data_path.clone())?;
    Ok(SubmissionService::with_cache(
        Arc::new(storage),
        QueryCache::new(config.query_cache),
    ))
}
