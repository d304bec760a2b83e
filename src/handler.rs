//! Trigger handling: turns one coalesced trigger into at most one audit entry.
//!
//! The handler reads current state through the repositories, compares it
//! with the cached snapshot for the entity, updates the cache and writes to
//! the log sink. It runs only on the tracker's worker thread.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::cache::{CacheSlot, SnapshotCaches};
use crate::diff::{format_entry, LogRefs};
use crate::error::HandlerError;
use crate::model::{EntityId, LogCreateModel, Project, Status, Task};
use crate::storage::{LogSink, Repositories};
use crate::trigger::{Action, ResourceKind, Trigger};

/// Metadata key producers may set on delete triggers to name the owning project.
pub const PROJECT_ID_METADATA_KEY: &str = "project_id";

/// What handling a trigger did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An audit entry was written.
    Logged {
        /// The entry text, e.g. `task.updated:title`.
        entry: String,
    },
    /// First observation through an update: the snapshot was stored as a
    /// baseline and nothing was logged.
    Baseline,
    /// No tracked field differed from the snapshot.
    Unchanged,
    /// The action does not apply to this resource kind.
    Ignored,
}

/// Dispatches triggers to the per-kind diff logic.
#[derive(Clone)]
pub struct TrailHandler {
    repos: Repositories,
    sink: Arc<dyn LogSink>,
}

impl std::fmt::Debug for TrailHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrailHandler").finish_non_exhaustive()
    }
}

impl TrailHandler {
    /// Create a handler reading from `repos` and writing to `sink`.
    #[must_use]
    pub fn new(repos: Repositories, sink: Arc<dyn LogSink>) -> Self {
        Self { repos, sink }
    }

    /// Handle one trigger against the given caches.
    ///
    /// # Errors
    ///
    /// - `HandlerError::Fetch` if the current state could not be read; the
    ///   cache is left untouched.
    /// - `HandlerError::Insert` if the log sink rejected the entry; the cache
    ///   has already been updated.
    pub fn handle(&self, caches: &mut SnapshotCaches, trigger: &Trigger) -> Result<Outcome, HandlerError> {
        match trigger.kind() {
            ResourceKind::Project => self.handle_kind::<Project>(caches, trigger),
            ResourceKind::Status => self.handle_kind::<Status>(caches, trigger),
            ResourceKind::Task => self.handle_kind::<Task>(caches, trigger),
        }
    }

    fn handle_kind<T: CacheSlot>(&self, caches: &mut SnapshotCaches, trigger: &Trigger) -> Result<Outcome, HandlerError> {
        let id = trigger.entity_id();
        match trigger.action() {
            Action::Created => {
                let current = T::fetch(&self.repos, id)?;
                let refs = current.log_refs();
                caches.of_mut::<T>().store(current);
                self.emit(refs, format_entry(T::KIND, Action::Created, &[]))
            }
            Action::Updated => {
                let current = T::fetch(&self.repos, id)?;
                let cache = caches.of_mut::<T>();
                let Some(previous) = cache.get(id) else {
                    debug!(kind = %T::KIND, %id, "no prior snapshot, storing baseline");
                    cache.store(current);
                    return Ok(Outcome::Baseline);
                };

                let fields = previous.changed_fields(&current);
                let refs = current.log_refs();
                cache.store(current);

                if fields.is_empty() {
                    Ok(Outcome::Unchanged)
                } else {
                    self.emit(refs, format_entry(T::KIND, Action::Updated, &fields))
                }
            }
            Action::Deleted => {
                let refs = match caches.of_mut::<T>().remove(id) {
                    Some(snapshot) => snapshot.log_refs(),
                    None => deleted_refs(T::KIND, id, trigger),
                };
                self.emit(refs, format_entry(T::KIND, Action::Deleted, &[]))
            }
            Action::StatusChanged => {
                if !T::TRACKS_STATUS_CHANGES {
                    debug!(kind = %T::KIND, %id, "status_changed does not apply, ignoring");
                    return Ok(Outcome::Ignored);
                }
                let current = T::fetch(&self.repos, id)?;
                let refs = current.status_change_refs();
                caches.of_mut::<T>().store(current);
                self.emit(refs, format_entry(T::KIND, Action::StatusChanged, &[]))
            }
        }
    }

    fn emit(&self, refs: LogRefs, entry: String) -> Result<Outcome, HandlerError> {
        self.sink.insert(LogCreateModel {
            project_id: refs.project_id,
            task_id: refs.task_id,
            status_id: refs.status_id,
            entry: entry.clone(),
            created_at: Utc::now(),
        })?;
        Ok(Outcome::Logged { entry })
    }
}

/// Log references for a delete with no cached snapshot.
///
/// The owning project comes from trigger metadata when the producer supplied
/// it; otherwise the deleted entity's own id stands in for it.
fn deleted_refs(kind: ResourceKind, id: EntityId, trigger: &Trigger) -> LogRefs {
    let parent = trigger
        .metadata_value(PROJECT_ID_METADATA_KEY)
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .map(EntityId::from_uuid);

    match kind {
        ResourceKind::Project => LogRefs {
            project_id: id,
            task_id: None,
            status_id: None,
        },
        ResourceKind::Status => LogRefs {
            project_id: parent.unwrap_or(id),
            task_id: None,
            status_id: Some(id),
        },
        ResourceKind::Task => LogRefs {
            project_id: parent.unwrap_or(id),
            task_id: Some(id),
            status_id: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use crate::error::{RepositoryError, SinkError};
    use crate::storage::{InMemoryLogSink, InMemoryRepositories};

    struct Fixture {
        repos: InMemoryRepositories,
        sink: Arc<InMemoryLogSink>,
        handler: TrailHandler,
        caches: SnapshotCaches,
    }

    fn fixture() -> Fixture {
        let repos = InMemoryRepositories::new();
        let sink = Arc::new(InMemoryLogSink::new());
        let handler = TrailHandler::new(repos.repositories(), Arc::clone(&sink) as Arc<dyn LogSink>);
        Fixture {
            repos,
            sink,
            handler,
            caches: SnapshotCaches::new(),
        }
    }

    fn trigger(kind: ResourceKind, id: EntityId, action: Action) -> Trigger {
        Trigger::new(kind, id, action).unwrap()
    }

    #[test]
    fn created_caches_and_logs() {
        let mut fx = fixture();
        let project = Project::new("apollo");
        fx.repos.projects.upsert(project.clone()).unwrap();

        let out = fx
            .handler
            .handle(&mut fx.caches, &trigger(ResourceKind::Project, project.id, Action::Created))
            .unwrap();

        assert_eq!(out, Outcome::Logged { entry: "project.created".to_string() });
        assert!(fx.caches.contains(ResourceKind::Project, project.id));
        let logged = fx.sink.entries();
        assert_eq!(logged[0].log.project_id, project.id);
    }

    #[test]
    fn created_fetch_failure_neither_caches_nor_logs() {
        let mut fx = fixture();
        let id = EntityId::new();

        let err = fx
            .handler
            .handle(&mut fx.caches, &trigger(ResourceKind::Task, id, Action::Created))
            .unwrap_err();

        assert!(matches!(err, HandlerError::Fetch(RepositoryError::NotFound { .. })));
        assert!(!fx.caches.contains(ResourceKind::Task, id));
        assert!(fx.sink.is_empty());
    }

    #[test]
    fn updated_warms_cold_cache_then_diffs() {
        let mut fx = fixture();
        let project = Project::new("apollo");
        let status = Status::new(project.id, "todo", 0);
        let mut task = Task::new(project.id, status.id, "write docs");
        fx.repos.tasks.upsert(task.clone()).unwrap();
        let t = trigger(ResourceKind::Task, task.id, Action::Updated);

        assert_eq!(fx.handler.handle(&mut fx.caches, &t).unwrap(), Outcome::Baseline);
        assert!(fx.sink.is_empty());

        task.priority = 3;
        fx.repos.tasks.upsert(task.clone()).unwrap();
        assert_eq!(
            fx.handler.handle(&mut fx.caches, &t).unwrap(),
            Outcome::Logged { entry: "task.updated:priority".to_string() }
        );

        let logged = fx.sink.entries();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].log.project_id, project.id);
        assert_eq!(logged[0].log.task_id, Some(task.id));

        // Snapshot was overwritten, so a repeat is unchanged.
        assert_eq!(fx.handler.handle(&mut fx.caches, &t).unwrap(), Outcome::Unchanged);
        assert_eq!(fx.sink.len(), 1);
    }

    #[test]
    fn updated_fetch_failure_keeps_previous_snapshot() {
        let mut fx = fixture();
        let status = Status::new(EntityId::new(), "todo", 0);
        fx.repos.statuses.upsert(status.clone()).unwrap();
        let t = trigger(ResourceKind::Status, status.id, Action::Updated);
        fx.handler.handle(&mut fx.caches, &t).unwrap();

        fx.repos.statuses.remove(status.id).unwrap();
        assert!(fx.handler.handle(&mut fx.caches, &t).is_err());
        assert_eq!(fx.caches.of::<Status>().get(status.id), Some(&status));
    }

    #[test]
    fn deleted_forgets_snapshot_and_uses_cached_parent() {
        let mut fx = fixture();
        let project = Project::new("apollo");
        let status = Status::new(project.id, "todo", 0);
        fx.repos.statuses.upsert(status.clone()).unwrap();
        fx.handler
            .handle(&mut fx.caches, &trigger(ResourceKind::Status, status.id, Action::Created))
            .unwrap();

        let out = fx
            .handler
            .handle(&mut fx.caches, &trigger(ResourceKind::Status, status.id, Action::Deleted))
            .unwrap();

        assert_eq!(out, Outcome::Logged { entry: "status.deleted".to_string() });
        assert!(!fx.caches.contains(ResourceKind::Status, status.id));
        let last = fx.sink.entries().pop().unwrap();
        assert_eq!(last.log.project_id, project.id);
        assert_eq!(last.log.status_id, Some(status.id));
    }

    #[test]
    fn deleted_without_snapshot_prefers_metadata_parent() {
        let mut fx = fixture();
        let project_id = EntityId::new();
        let task_id = EntityId::new();

        let mut meta = BTreeMap::new();
        meta.insert(PROJECT_ID_METADATA_KEY.to_string(), project_id.to_string());
        let with_meta = Trigger::with_metadata(ResourceKind::Task, task_id, Action::Deleted, meta).unwrap();
        fx.handler.handle(&mut fx.caches, &with_meta).unwrap();

        let other_task = EntityId::new();
        fx.handler
            .handle(&mut fx.caches, &trigger(ResourceKind::Task, other_task, Action::Deleted))
            .unwrap();

        let logged = fx.sink.entries();
        assert_eq!(logged[0].log.project_id, project_id);
        assert_eq!(logged[0].log.task_id, Some(task_id));
        assert_eq!(logged[1].log.project_id, other_task);
        assert_eq!(logged[1].entry(), "task.deleted");
    }

    #[test]
    fn status_changed_overwrites_snapshot_and_carries_status() {
        let mut fx = fixture();
        let project = Project::new("apollo");
        let todo = Status::new(project.id, "todo", 0);
        let done = Status::new(project.id, "done", 1);
        let mut task = Task::new(project.id, todo.id, "write docs");
        fx.repos.tasks.upsert(task.clone()).unwrap();

        task.status_id = done.id;
        fx.repos.tasks.upsert(task.clone()).unwrap();

        let out = fx
            .handler
            .handle(&mut fx.caches, &trigger(ResourceKind::Task, task.id, Action::StatusChanged))
            .unwrap();
        assert_eq!(out, Outcome::Logged { entry: "task.status_changed".to_string() });

        let logged = fx.sink.entries();
        assert_eq!(logged[0].log.project_id, project.id);
        assert_eq!(logged[0].log.task_id, Some(task.id));
        assert_eq!(logged[0].log.status_id, Some(done.id));
        assert_eq!(fx.caches.of::<Task>().get(task.id).unwrap().status_id, done.id);
    }

    #[test]
    fn status_changed_is_ignored_for_projects() {
        let mut fx = fixture();
        let project = Project::new("apollo");
        fx.repos.projects.upsert(project.clone()).unwrap();

        let out = fx
            .handler
            .handle(&mut fx.caches, &trigger(ResourceKind::Project, project.id, Action::StatusChanged))
            .unwrap();

        assert_eq!(out, Outcome::Ignored);
        assert!(fx.sink.is_empty());
        assert!(!fx.caches.contains(ResourceKind::Project, project.id));
    }

    #[test]
    fn insert_failure_surfaces_after_caching() {
        struct RejectingSink;
        impl LogSink for RejectingSink {
            fn insert(&self, _log: LogCreateModel) -> Result<(), SinkError> {
                Err(SinkError::Backend("read-only".to_string()))
            }
        }

        let repos = InMemoryRepositories::new();
        let handler = TrailHandler::new(repos.repositories(), Arc::new(RejectingSink));
        let mut caches = SnapshotCaches::new();
        let project = Project::new("apollo");
        repos.projects.upsert(project.clone()).unwrap();

        let err = handler
            .handle(&mut caches, &trigger(ResourceKind::Project, project.id, Action::Created))
            .unwrap_err();

        assert!(matches!(err, HandlerError::Insert(_)));
        assert!(caches.contains(ResourceKind::Project, project.id));
    }
}
