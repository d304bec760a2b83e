//! Last-observed entity state, one cache per resource kind.
//!
//! Caches start empty when a tracker is built and are dropped with it. Only
//! the worker thread mutates them; the surrounding mutex exists so that
//! read-only introspection from other threads stays safe.

use std::collections::HashMap;

use crate::diff::TrackedResource;
use crate::model::{EntityId, Project, Status, Task};
use crate::trigger::ResourceKind;

/// Snapshots of one resource kind keyed by entity id.
#[derive(Debug, Clone)]
pub struct SnapshotCache<T> {
    by_id: HashMap<EntityId, T>,
}

impl<T> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self { by_id: HashMap::new() }
    }
}

impl<T: TrackedResource> SnapshotCache<T> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot for `id`, if one is cached.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.by_id.get(&id)
    }

    /// Store `state` as the snapshot for its id, returning the previous one.
    pub fn store(&mut self, state: T) -> Option<T> {
        self.by_id.insert(state.id(), state)
    }

    /// Forget the snapshot for `id`, if any.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.by_id.remove(&id)
    }

    /// Returns true if a snapshot for `id` is cached.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Number of cached snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Picks the cache for one resource kind out of [`SnapshotCaches`].
pub trait CacheSlot: TrackedResource {
    /// Borrow the cache for this kind.
    fn cache(caches: &SnapshotCaches) -> &SnapshotCache<Self>;
    /// Mutably borrow the cache for this kind.
    fn cache_mut(caches: &mut SnapshotCaches) -> &mut SnapshotCache<Self>;
}

/// The full set of per-kind caches owned by one tracker.
#[derive(Debug, Default, Clone)]
pub struct SnapshotCaches {
    projects: SnapshotCache<Project>,
    statuses: SnapshotCache<Status>,
    tasks: SnapshotCache<Task>,
}

impl SnapshotCaches {
    /// Create empty caches for every kind.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache for `T`'s kind.
    #[must_use]
    pub fn of<T: CacheSlot>(&self) -> &SnapshotCache<T> {
        T::cache(self)
    }

    /// The mutable cache for `T`'s kind.
    pub fn of_mut<T: CacheSlot>(&mut self) -> &mut SnapshotCache<T> {
        T::cache_mut(self)
    }

    /// Number of snapshots held for a kind.
    #[must_use]
    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Project => self.projects.len(),
            ResourceKind::Status => self.statuses.len(),
            ResourceKind::Task => self.tasks.len(),
        }
    }

    /// Whether a snapshot exists for `(kind, id)`.
    #[must_use]
    pub fn contains(&self, kind: ResourceKind, id: EntityId) -> bool {
        match kind {
            ResourceKind::Project => self.projects.contains(id),
            ResourceKind::Status => self.statuses.contains(id),
            ResourceKind::Task => self.tasks.contains(id),
        }
    }
}

impl CacheSlot for Project {
    fn cache(caches: &SnapshotCaches) -> &SnapshotCache<Self> {
        &caches.projects
    }

    fn cache_mut(caches: &mut SnapshotCaches) -> &mut SnapshotCache<Self> {
        &mut caches.projects
    }
}

impl CacheSlot for Status {
    fn cache(caches: &SnapshotCaches) -> &SnapshotCache<Self> {
        &caches.statuses
    }

    fn cache_mut(caches: &mut SnapshotCaches) -> &mut SnapshotCache<Self> {
        &mut caches.statuses
    }
}

impl CacheSlot for Task {
    fn cache(caches: &SnapshotCaches) -> &SnapshotCache<Self> {
        &caches.tasks
    }

    fn cache_mut(caches: &mut SnapshotCaches) -> &mut SnapshotCache<Self> {
        &mut caches.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_replaces_and_remove_forgets() {
        let mut cache = SnapshotCache::<Project>::new();
        let mut p = Project::new("apollo");
        let id = p.id;

        assert!(cache.store(p.clone()).is_none());
        p.name = "artemis".to_string();
        let prev = cache.store(p.clone()).unwrap();
        assert_eq!(prev.name, "apollo");
        assert_eq!(cache.get(id).unwrap().name, "artemis");

        assert!(cache.remove(id).is_some());
        assert!(cache.remove(id).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn kinds_are_isolated() {
        let mut caches = SnapshotCaches::new();
        let project = Project::new("apollo");
        let status = Status::new(project.id, "todo", 0);

        caches.of_mut::<Project>().store(project.clone());
        caches.of_mut::<Status>().store(status.clone());

        assert_eq!(caches.count(ResourceKind::Project), 1);
        assert_eq!(caches.count(ResourceKind::Status), 1);
        assert_eq!(caches.count(ResourceKind::Task), 0);
        assert!(caches.contains(ResourceKind::Project, project.id));
        assert!(!caches.contains(ResourceKind::Task, project.id));
        assert_eq!(caches.of::<Status>().get(status.id), Some(&status));
    }
}
