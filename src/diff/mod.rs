//! Per-resource-kind state comparison.
//!
//! Every audited state type implements [`TrackedResource`]: it knows its kind,
//! how to fetch itself through [`Repositories`], which fields are tracked, and
//! which identifiers its log entries carry. Only whitelisted fields are
//! compared; the change-set lists differing fields in declaration order.

mod project;
mod status;
mod task;

use crate::error::RepositoryError;
use crate::model::EntityId;
use crate::storage::Repositories;
use crate::trigger::{Action, ResourceKind};

pub use project::PROJECT_FIELDS;
pub use status::STATUS_FIELDS;
pub use task::TASK_FIELDS;

/// Identifiers attached to a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRefs {
    /// Owning project (always present).
    pub project_id: EntityId,
    /// Task the entry is about, if any.
    pub task_id: Option<EntityId>,
    /// Status the entry is about, if any.
    pub status_id: Option<EntityId>,
}

/// Capability shared by all audited resource kinds.
pub trait TrackedResource: Clone + Send + Sync + 'static {
    /// The kind tag used for dispatch and log prefixes.
    const KIND: ResourceKind;

    /// Tracked field names in declaration order.
    const TRACKED_FIELDS: &'static [&'static str];

    /// The entity's own id.
    fn id(&self) -> EntityId;

    /// Fetch the authoritative current state.
    fn fetch(repos: &Repositories, id: EntityId) -> Result<Self, RepositoryError>;

    /// Tracked fields whose value differs between `self` (the previous
    /// snapshot) and `current`, in declaration order.
    fn changed_fields(&self, current: &Self) -> Vec<&'static str>;

    /// Identifiers for log entries about this entity.
    fn log_refs(&self) -> LogRefs;

    /// Whether `status_changed` triggers apply to this kind.
    const TRACKS_STATUS_CHANGES: bool = false;

    /// Identifiers for a `status_changed` entry.
    fn status_change_refs(&self) -> LogRefs {
        self.log_refs()
    }
}

/// Walks a kind's `TRACKED_FIELDS` in order, one `track` call per field,
/// and collects the names whose values differ.
#[derive(Debug)]
pub(crate) struct ChangeSet {
    names: &'static [&'static str],
    next: usize,
    fields: Vec<&'static str>,
}

impl ChangeSet {
    pub(crate) fn new(names: &'static [&'static str]) -> Self {
        Self {
            names,
            next: 0,
            fields: Vec::new(),
        }
    }

    pub(crate) fn track<V: PartialEq + ?Sized>(&mut self, previous: &V, current: &V) -> &mut Self {
        debug_assert!(self.next < self.names.len(), "more comparisons than tracked fields");
        if let Some(name) = self.names.get(self.next) {
            if previous != current {
                self.fields.push(*name);
            }
        }
        self.next += 1;
        self
    }

    pub(crate) fn finish(&mut self) -> Vec<&'static str> {
        debug_assert_eq!(self.next, self.names.len(), "every tracked field must be compared");
        std::mem::take(&mut self.fields)
    }
}

/// Render a log entry text such as `task.created` or
/// `project.updated:name,status`.
#[must_use]
pub fn format_entry(kind: ResourceKind, action: Action, fields: &[&str]) -> String {
    if fields.is_empty() {
        format!("{kind}.{action}")
    } else {
        format!("{kind}.{action}:{}", fields.join(","))
    }
}
