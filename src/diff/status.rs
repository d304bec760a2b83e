use crate::error::RepositoryError;
use crate::model::{EntityId, Status};
use crate::storage::Repositories;
use crate::trigger::ResourceKind;

use super::{ChangeSet, LogRefs, TrackedResource};

/// Tracked status fields.
pub const STATUS_FIELDS: &[&str] = &["name", "position", "isDefault"];

impl TrackedResource for Status {
    const KIND: ResourceKind = ResourceKind::Status;
    const TRACKED_FIELDS: &'static [&'static str] = STATUS_FIELDS;

    fn id(&self) -> EntityId {
        self.id
    }

    fn fetch(repos: &Repositories, id: EntityId) -> Result<Self, RepositoryError> {
        repos.statuses.get_detail(id)
    }

    fn changed_fields(&self, current: &Self) -> Vec<&'static str> {
        ChangeSet::new(Self::TRACKED_FIELDS)
            .track(&self.name, &current.name)
            .track(&self.position, &current.position)
            .track(&self.is_default, &current.is_default)
            .finish()
    }

    fn log_refs(&self) -> LogRefs {
        LogRefs {
            project_id: self.project_id,
            task_id: None,
            status_id: Some(self.id),
        }
    }
}
