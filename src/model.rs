//! Entity state and audit log types.
//!
//! The tracker never writes these entities; it only reads their authoritative
//! current state from repositories and compares it against the last state it
//! observed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier shared by projects, statuses and tasks.
///
/// # Examples
///
/// ```
/// use changetrail::EntityId;
///
/// let id = EntityId::new();
/// assert!(!id.is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Creates a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entity ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns true if this is a nil (all zeros) UUID.
    ///
    /// A nil ID is treated as empty and never accepted into the inbox.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Creates a nil entity ID.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Current state of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Project-level status label, e.g. `active` or `archived`.
    pub status: String,
}

impl Project {
    /// Creates a project with an empty description and `active` status.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            description: String::new(),
            status: "active".to_string(),
        }
    }
}

/// Current state of a workflow status (a board column) within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Status id.
    pub id: EntityId,
    /// Owning project.
    pub project_id: EntityId,
    /// Column name.
    pub name: String,
    /// Sort position on the board.
    pub position: i32,
    /// Whether new tasks land in this status.
    pub is_default: bool,
}

impl Status {
    /// Creates a non-default status at the given position.
    #[must_use]
    pub fn new(project_id: EntityId, name: impl Into<String>, position: i32) -> Self {
        Self {
            id: EntityId::new(),
            project_id,
            name: name.into(),
            position,
            is_default: false,
        }
    }
}

/// Current state of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task id.
    pub id: EntityId,
    /// Owning project.
    pub project_id: EntityId,
    /// Status (column) the task is in.
    pub status_id: EntityId,
    /// Title.
    pub title: String,
    /// Long description.
    pub details: String,
    /// Priority; higher is more urgent.
    pub priority: i32,
    /// Optional deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a task with no details, priority 0 and no due date.
    #[must_use]
    pub fn new(project_id: EntityId, status_id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            project_id,
            status_id,
            title: title.into(),
            details: String::new(),
            priority: 0,
            due_date: None,
        }
    }
}

/// An audit entry as written by the tracker.
///
/// `project_id` is always present; `task_id` and `status_id` identify the
/// entity the entry is about when it is not the project itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCreateModel {
    /// Owning project.
    pub project_id: EntityId,
    /// Task the entry is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<EntityId>,
    /// Status the entry is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<EntityId>,
    /// Entry text, e.g. `project.updated:name,status`.
    pub entry: String,
    /// When the tracker produced the entry.
    pub created_at: DateTime<Utc>,
}

/// An audit entry as stored by a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Sink-assigned id.
    pub id: Uuid,
    /// The entry as the tracker produced it.
    #[serde(flatten)]
    pub log: LogCreateModel,
}

impl LogEntry {
    /// Assigns a fresh id to a log model.
    #[must_use]
    pub fn from_model(log: LogCreateModel) -> Self {
        Self {
            id: Uuid::new_v4(),
            log,
        }
    }

    /// The entry text, e.g. `task.updated:title,priority`.
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.log.entry
    }
}
