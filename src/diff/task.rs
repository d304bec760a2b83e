use crate::error::RepositoryError;
use crate::model::{EntityId, Task};
use crate::storage::Repositories;
use crate::trigger::ResourceKind;

use super::{ChangeSet, LogRefs, TrackedResource};

/// Tracked task fields.
pub const TASK_FIELDS: &[&str] = &["title", "details", "statusId", "priority", "dueDate"];

impl TrackedResource for Task {
    const KIND: ResourceKind = ResourceKind::Task;
    const TRACKED_FIELDS: &'static [&'static str] = TASK_FIELDS;

    fn id(&self) -> EntityId {
        self.id
    }

    fn fetch(repos: &Repositories, id: EntityId) -> Result<Self, RepositoryError> {
        repos.tasks.get_detail(id)
    }

    fn changed_fields(&self, current: &Self) -> Vec<&'static str> {
        // Option equality: both unset, or both set to the same instant, is unchanged.
        ChangeSet::new(Self::TRACKED_FIELDS)
            .track(&self.title, &current.title)
            .track(&self.details, &current.details)
            .track(&self.status_id, &current.status_id)
            .track(&self.priority, &current.priority)
            .track(&self.due_date, &current.due_date)
            .finish()
    }

    fn log_refs(&self) -> LogRefs {
        LogRefs {
            project_id: self.project_id,
            task_id: Some(self.id),
            status_id: None,
        }
    }

    const TRACKS_STATUS_CHANGES: bool = true;

    fn status_change_refs(&self) -> LogRefs {
        LogRefs {
            status_id: Some(self.status_id),
            ..self.log_refs()
        }
    }
}
