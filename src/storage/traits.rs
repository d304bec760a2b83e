//! Collaborator traits for changetrail.
//!
//! The tracker reads authoritative current state through the repository
//! traits and appends audit entries through [`LogSink`]. Both sides live
//! outside this crate in production (SQL repositories, a log table); the
//! in-memory backends in this module tree serve embedded use and tests.

use std::sync::Arc;

use crate::error::{RepositoryError, SinkError};
use crate::model::{EntityId, LogCreateModel, Project, Status, Task};

/// Read access to projects.
pub trait ProjectRepository: Send + Sync {
    /// Fetch the current state of a project.
    ///
    /// # Errors
    /// - `NotFound`: the project does not exist
    /// - `Backend`: any other failure
    fn get_detail(&self, id: EntityId) -> Result<Project, RepositoryError>;
}

/// Read access to statuses.
pub trait StatusRepository: Send + Sync {
    /// Fetch the current state of a status.
    ///
    /// # Errors
    /// - `NotFound`: the status does not exist
    /// - `Backend`: any other failure
    fn get_detail(&self, id: EntityId) -> Result<Status, RepositoryError>;
}

/// Read access to tasks.
pub trait TaskRepository: Send + Sync {
    /// Fetch the current state of a task.
    ///
    /// # Errors
    /// - `NotFound`: the task does not exist
    /// - `Backend`: any other failure
    fn get_detail(&self, id: EntityId) -> Result<Task, RepositoryError>;
}

/// Append-only audit log sink.
///
/// Failures are observed by the tracker but never retried.
pub trait LogSink: Send + Sync {
    /// Append one audit entry.
    fn insert(&self, log: LogCreateModel) -> Result<(), SinkError>;
}

/// The repositories a tracker reads from.
#[derive(Clone)]
pub struct Repositories {
    /// Project repository.
    pub projects: Arc<dyn ProjectRepository>,
    /// Status repository.
    pub statuses: Arc<dyn StatusRepository>,
    /// Task repository.
    pub tasks: Arc<dyn TaskRepository>,
}

impl Repositories {
    /// Bundle three repositories.
    #[must_use]
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        statuses: Arc<dyn StatusRepository>,
        tasks: Arc<dyn TaskRepository>,
    ) -> Self {
        Self {
            projects,
            statuses,
            tasks,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
