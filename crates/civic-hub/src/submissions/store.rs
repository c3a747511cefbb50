use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use super::domain::{Submission, SubmissionId};
use super::filter::{apply_filter, SubmissionFilter};
use super::repository::{RepositoryError, SubmissionRepository};

/// Insertion-ordered submissions table shared by the repository implementations.
#[derive(Debug, Clone, Default)]
pub struct SubmissionTable {
    rows: Vec<Submission>,
}

impl SubmissionTable {
    pub fn from_rows(rows: Vec<Submission>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Submission] {
        &self.rows
    }

    fn position(&self, id: &SubmissionId) -> Option<usize> {
        self.rows.iter().position(|row| &row.id == id)
    }

    pub fn insert(&mut self, submission: Submission) -> Result<Submission, RepositoryError> {
        if self.position(&submission.id).is_some() {
            return Err(RepositoryError::Conflict);
        }
        self.rows.push(submission.clone());
        Ok(submission)
    }

    fn locate(&self, id: &SubmissionId) -> Result<usize, RepositoryError> {
        self.position(id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }

    /// Run `change` on a copy of the row and write it back only on success.
    pub fn modify<E, F>(&mut self, id: &SubmissionId, change: F) -> Result<Submission, E>
    where
        F: FnOnce(&mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let index = self.locate(id)?;
        let mut staged = self.rows[index].clone();
        change(&mut staged)?;
        self.rows[index] = staged.clone();
        Ok(staged)
    }

    /// Both ids are resolved before `change` runs; neither row is replaced on failure.
    pub fn modify_pair<E, F>(
        &mut self,
        first: &SubmissionId,
        second: &SubmissionId,
        change: F,
    ) -> Result<(Submission, Submission), E>
    where
        F: FnOnce(&mut Submission, &mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let first_index = self.locate(first)?;
        let second_index = self.locate(second)?;
        let mut staged_first = self.rows[first_index].clone();
        let mut staged_second = self.rows[second_index].clone();
        change(&mut staged_first, &mut staged_second)?;
        self.rows[first_index] = staged_first.clone();
        self.rows[second_index] = staged_second.clone();
        Ok((staged_first, staged_second))
    }

    pub fn fetch(&self, id: &SubmissionId) -> Option<Submission> {
        self.position(id).map(|index| self.rows[index].clone())
    }

    pub fn list(&self, filter: &SubmissionFilter) -> Vec<Submission> {
        apply_filter(self.rows.iter(), filter)
    }
}

fn lock(table: &Mutex<SubmissionTable>) -> Result<MutexGuard<'_, SubmissionTable>, RepositoryError> {
    table
        .lock()
        .map_err(|_| RepositoryError::Unavailable("submission table lock poisoned".to_string()))
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySubmissionRepository {
    table: Mutex<SubmissionTable>,
}

impl InMemorySubmissionRepository {
    pub fn with_rows(rows: Vec<Submission>) -> Self {
        Self {
            table: Mutex::new(SubmissionTable::from_rows(rows)),
        }
    }
}

impl SubmissionRepository for InMemorySubmissionRepository {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        lock(&self.table)?.insert(submission)
    }

    fn modify<E, F>(&self, id: &SubmissionId, change: F) -> Result<Submission, E>
    where
        F: FnOnce(&mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        lock(&self.table)?.modify(id, change)
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
        lock(&self.table)?.modify_pair(first, second, change)
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        Ok(lock(&self.table)?.fetch(id))
    }

    fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, RepositoryError> {
        Ok(lock(&self.table)?.list(filter))
    }
}

/// Store backed by a JSON snapshot on disk.
///
/// Every write is staged on a copy of the table, persisted through a temporary file and
/// an atomic rename, and only then committed to memory. A failed write changes nothing.
#[derive(Debug)]
pub struct JsonFileSubmissionRepository {
    path: PathBuf,
    table: Mutex<SubmissionTable>,
}

impl JsonFileSubmissionRepository {
    /// Load the snapshot at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let rows = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Vec<Submission>>(&bytes).map_err(|err| {
                RepositoryError::Unavailable(format!(
                    "snapshot {} is not valid JSON: {err}",
                    path.display()
                ))
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot yet, starting empty");
                Vec::new()
            }
            Err(err) => return Err(unavailable(&path, err)),
        };

        debug!(path = %path.display(), rows = rows.len(), "loaded submission snapshot");
        Ok(Self {
            path,
            table: Mutex::new(SubmissionTable::from_rows(rows)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_with<T, E>(
        &self,
        apply: impl FnOnce(&mut SubmissionTable) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        let mut guard = lock(&self.table)?;
        let mut staged = guard.clone();
        let result = apply(&mut staged)?;
        persist(&self.path, &staged)?;
        *guard = staged;
        Ok(result)
    }
}

fn unavailable(path: &Path, err: io::Error) -> RepositoryError {
    RepositoryError::Unavailable(format!("{}: {err}", path.display()))
}

fn persist(path: &Path, table: &SubmissionTable) -> Result<(), RepositoryError> {
    let bytes = serde_json::to_vec_pretty(table.rows())
        .map_err(|err| RepositoryError::Unavailable(format!("encode snapshot: {err}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| unavailable(parent, err))?;
    }

    let staging = path.with_extension("json.tmp");
    fs::write(&staging, bytes).map_err(|err| unavailable(&staging, err))?;
    fs::rename(&staging, path).map_err(|err| {
        warn!(path = %path.display(), "snapshot rename failed");
        unavailable(path, err)
    })
}

impl SubmissionRepository for JsonFileSubmissionRepository {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        self.write_with(|table| table.insert(submission))
    }

    fn modify<E, F>(&self, id: &SubmissionId, change: F) -> Result<Submission, E>
    where
        F: FnOnce(&mut Submission) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        self.write_with(|table| table.modify(id, change))
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
        self.write_with(|table| table.modify_pair(first, second, change))
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        Ok(lock(&self.table)?.fetch(id))
    }

    fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, RepositoryError> {
        Ok(lock(&self.table)?.list(filter))
    }
}
