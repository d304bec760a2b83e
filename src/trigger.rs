//! Trigger types: the events producers hand to the tracker after a mutation.
//!
//! These types are serializable so producers can forward them from other
//! layers (e.g. a service bus) without a translation step.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::EntityId;

/// The closed set of resource kinds the tracker audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A project.
    Project,
    /// A workflow status within a project.
    Status,
    /// A task within a project.
    Task,
}

impl ResourceKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 3] = [Self::Project, Self::Status, Self::Task];

    /// The wire name used as the log entry prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Status => "status",
            Self::Task => "task",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(ValidationError::EmptyResourceKind),
            "project" => Ok(Self::Project),
            "status" => Ok(Self::Status),
            "task" => Ok(Self::Task),
            other => Err(ValidationError::UnknownResourceKind {
                value: other.to_string(),
            }),
        }
    }
}

/// The mutation a trigger reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// The entity was created.
    Created,
    /// One or more fields of the entity changed.
    Updated,
    /// The entity was deleted.
    Deleted,
    /// A task moved to another status.
    StatusChanged,
}

impl Action {
    /// The wire name used as the log entry suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::StatusChanged => "status_changed",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            "status_changed" => Ok(Self::StatusChanged),
            other => Err(ValidationError::UnknownAction {
                value: other.to_string(),
            }),
        }
    }
}

/// Coalescing key: at most one pending trigger exists per key between drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerKey {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Entity id.
    pub entity_id: EntityId,
}

/// An immutable mutation event.
///
/// # Examples
///
/// ```
/// use changetrail::{Action, EntityId, ResourceKind, Trigger};
///
/// let trigger = Trigger::new(ResourceKind::Task, EntityId::new(), Action::Updated).unwrap();
/// assert_eq!(trigger.action(), Action::Updated);
/// assert!(Trigger::new(ResourceKind::Task, EntityId::nil(), Action::Updated).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    kind: ResourceKind,
    entity_id: EntityId,
    action: Action,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

impl Trigger {
    /// Creates a trigger without metadata.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyEntityId` if `entity_id` is nil.
    pub fn new(kind: ResourceKind, entity_id: EntityId, action: Action) -> Result<Self, ValidationError> {
        Self::with_metadata(kind, entity_id, action, BTreeMap::new())
    }

    /// Creates a trigger carrying producer metadata.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyEntityId` if `entity_id` is nil.
    pub fn with_metadata(
        kind: ResourceKind,
        entity_id: EntityId,
        action: Action,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self, ValidationError> {
        if entity_id.is_nil() {
            return Err(ValidationError::EmptyEntityId);
        }
        Ok(Self {
            kind,
            entity_id,
            action,
            metadata,
        })
    }

    /// Parses a trigger from wire strings.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for an empty or unknown kind, an unknown
    /// action, or a nil entity id.
    pub fn parse(kind: &str, entity_id: EntityId, action: &str) -> Result<Self, ValidationError> {
        Self::new(kind.parse()?, entity_id, action.parse()?)
    }

    /// Resource kind the trigger is about.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Id of the mutated entity.
    #[must_use]
    pub const fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// What happened to the entity.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Producer-supplied context.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Looks up a metadata value.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// The coalescing key for this trigger.
    #[must_use]
    pub const fn key(&self) -> TriggerKey {
        TriggerKey {
            kind: self.kind,
            entity_id: self.entity_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_wire_names() {
        assert_eq!("task".parse::<ResourceKind>().unwrap(), ResourceKind::Task);
        assert_eq!(" project ".parse::<ResourceKind>().unwrap(), ResourceKind::Project);
        assert_eq!("".parse::<ResourceKind>().unwrap_err(), ValidationError::EmptyResourceKind);
        assert!(matches!(
            "milestone".parse::<ResourceKind>(),
            Err(ValidationError::UnknownResourceKind { .. })
        ));
    }

    #[test]
    fn action_round_trips_display() {
        for action in [Action::Created, Action::Updated, Action::Deleted, Action::StatusChanged] {
            assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn trigger_rejects_nil_id() {
        let err = Trigger::new(ResourceKind::Status, EntityId::nil(), Action::Created).unwrap_err();
        assert_eq!(err, ValidationError::EmptyEntityId);
    }

    #[test]
    fn trigger_parse_rejects_unknown_action() {
        let err = Trigger::parse("task", EntityId::new(), "archived").unwrap_err();
        assert!(matches!(err, ValidationError::UnknownAction { .. }));
    }

    #[test]
    fn key_ignores_action_and_metadata() {
        let id = EntityId::new();
        let mut meta = BTreeMap::new();
        meta.insert("project_id".to_string(), EntityId::new().to_string());

        let a = Trigger::new(ResourceKind::Task, id, Action::Created).unwrap();
        let b = Trigger::with_metadata(ResourceKind::Task, id, Action::Deleted, meta).unwrap();
        let c = Trigger::new(ResourceKind::Status, id, Action::Created).unwrap();

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn trigger_serializes_snake_case() {
        let trigger = Trigger::new(ResourceKind::Task, EntityId::new(), Action::StatusChanged).unwrap();
        let json = serde_json::to_value(&trigger).unwrap();
        assert_eq!(json["kind"], "task");
        assert_eq!(json["action"], "status_changed");
        assert!(json.get("metadata").is_none());
    }
}
