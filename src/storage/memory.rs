//! In-memory storage backend.
//!
//! Thread-safe in-memory implementations of the repository and sink traits.
//! They are intended for embedded usage, tests, and as a reference
//! implementation of the collaborator contracts.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::diff::TrackedResource;
use crate::error::{RepositoryError, SinkError};
use crate::model::{EntityId, LogCreateModel, LogEntry, Project, Status, Task};
use crate::storage::traits::{
    LogSink, ProjectRepository, Repositories, StatusRepository, TaskRepository,
};

fn lock_err(context: &'static str) -> RepositoryError {
    RepositoryError::Backend(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory table of one resource kind.
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    rows: RwLock<HashMap<EntityId, T>>,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: TrackedResource> InMemoryRepository<T> {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a row.
    pub fn upsert(&self, row: T) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().map_err(|_| lock_err("repository.upsert"))?;
        rows.insert(row.id(), row);
        Ok(())
    }

    /// Remove a row, returning it if present.
    pub fn remove(&self, id: EntityId) -> Result<Option<T>, RepositoryError> {
        let mut rows = self.rows.write().map_err(|_| lock_err("repository.remove"))?;
        Ok(rows.remove(&id))
    }

    /// Number of stored rows.
    pub fn len(&self) -> Result<usize, RepositoryError> {
        let rows = self.rows.read().map_err(|_| lock_err("repository.len"))?;
        Ok(rows.len())
    }

    /// Returns true if no rows are stored.
    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }

    fn get_row(&self, id: EntityId) -> Result<T, RepositoryError> {
        let rows = self.rows.read().map_err(|_| lock_err("repository.get_detail"))?;
        rows.get(&id).cloned().ok_or(RepositoryError::NotFound { kind: T::KIND, id })
    }
}

impl ProjectRepository for InMemoryRepository<Project> {
    fn get_detail(&self, id: EntityId) -> Result<Project, RepositoryError> {
        self.get_row(id)
    }
}

impl StatusRepository for InMemoryRepository<Status> {
    fn get_detail(&self, id: EntityId) -> Result<Status, RepositoryError> {
        self.get_row(id)
    }
}

impl TaskRepository for InMemoryRepository<Task> {
    fn get_detail(&self, id: EntityId) -> Result<Task, RepositoryError> {
        self.get_row(id)
    }
}

/// In-memory project repository.
pub type InMemoryProjectRepository = InMemoryRepository<Project>;
/// In-memory status repository.
pub type InMemoryStatusRepository = InMemoryRepository<Status>;
/// In-memory task repository.
pub type InMemoryTaskRepository = InMemoryRepository<Task>;

/// Convenience bundle of in-memory repositories.
///
/// Fields are shared so callers can keep mutating rows after handing the
/// bundle to a tracker.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepositories {
    /// Project repository.
    pub projects: Arc<InMemoryProjectRepository>,
    /// Status repository.
    pub statuses: Arc<InMemoryStatusRepository>,
    /// Task repository.
    pub tasks: Arc<InMemoryTaskRepository>,
}

impl InMemoryRepositories {
    /// Create a new bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Type-erased view for the tracker.
    #[must_use]
    pub fn repositories(&self) -> Repositories {
        Repositories::new(
            Arc::clone(&self.projects) as Arc<dyn ProjectRepository>,
            Arc::clone(&self.statuses) as Arc<dyn StatusRepository>,
            Arc::clone(&self.tasks) as Arc<dyn TaskRepository>,
        )
    }
}

/// Thread-safe in-memory audit log.
#[derive(Debug, Default)]
pub struct InMemoryLogSink {
    entries: RwLock<Vec<LogEntry>>,
}

impl InMemoryLogSink {
    /// Create a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, Vec<LogEntry>> {
        // A writer that panicked mid-push cannot leave a torn entry behind.
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// All entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.read_entries().clone()
    }

    /// Entry texts in insertion order.
    #[must_use]
    pub fn entry_texts(&self) -> Vec<String> {
        self.read_entries().iter().map(|l| l.log.entry.clone()).collect()
    }

    /// Entries belonging to one project.
    #[must_use]
    pub fn entries_for_project(&self, project_id: EntityId) -> Vec<LogEntry> {
        self.read_entries()
            .iter()
            .filter(|l| l.log.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    /// Returns true if nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for InMemoryLogSink {
    fn insert(&self, log: LogCreateModel) -> Result<(), SinkError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SinkError::Backend("poisoned lock: log.insert".to_string()))?;
        entries.push(LogEntry::from_model(log));
        Ok(())
    }
}
