use crate::error::RepositoryError;
use crate::model::{EntityId, Project};
use crate::storage::Repositories;
use crate::trigger::ResourceKind;

use super::{ChangeSet, LogRefs, TrackedResource};

/// Tracked project fields.
pub const PROJECT_FIELDS: &[&str] = &["name", "description", "status"];

impl TrackedResource for Project {
    const KIND: ResourceKind = ResourceKind::Project;
    const TRACKED_FIELDS: &'static [&'static str] = PROJECT_FIELDS;

    fn id(&self) -> EntityId {
        self.id
    }

    fn fetch(repos: &Repositories, id: EntityId) -> Result<Self, RepositoryError> {
        repos.projects.get_detail(id)
    }

    fn changed_fields(&self, current: &Self) -> Vec<&'static str> {
        ChangeSet::new(Self::TRACKED_FIELDS)
            .track(&self.name, &current.name)
            .track(&self.description, &current.description)
            .track(&self.status, &current.status)
            .finish()
    }

    fn log_refs(&self) -> LogRefs {
        LogRefs {
            project_id: self.id,
            task_id: None,
            status_id: None,
        }
    }
}
