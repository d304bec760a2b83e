//! Error types for changetrail.
//!
//! Errors are strongly typed using thiserror. None of them ever reaches the
//! thread that enqueued a trigger: the pipeline is best-effort, so handler
//! errors are observed by the worker, logged and counted, then dropped.

use thiserror::Error;

use crate::model::EntityId;
use crate::trigger::ResourceKind;

/// Validation errors for trigger input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The trigger carried a nil entity id.
    #[error("Entity id cannot be empty")]
    EmptyEntityId,

    /// The resource kind string was empty.
    #[error("Resource kind cannot be empty")]
    EmptyResourceKind,

    /// The resource kind string named no known kind.
    #[error("Unknown resource kind '{value}'")]
    UnknownResourceKind {
        /// The rejected input.
        value: String,
    },

    /// The action string named no known action.
    #[error("Unknown action '{value}'")]
    UnknownAction {
        /// The rejected input.
        value: String,
    },
}

/// Errors returned by the repositories the tracker reads current state from.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The entity does not exist (or no longer exists).
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind that was looked up.
        kind: ResourceKind,
        /// Id that was looked up.
        id: EntityId,
    },

    /// Backend failure.
    #[error("Repository backend error: {0}")]
    Backend(String),
}

/// Errors returned by the audit log sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The entry could not be encoded.
    #[error("Failed to serialize log entry: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing to the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("Log sink backend error: {0}")]
    Backend(String),
}

/// Errors that abort the handling of one coalesced trigger.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Reading current state from a repository failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] RepositoryError),

    /// Writing the audit entry failed; the snapshot was already updated.
    #[error("Log insert failed: {0}")]
    Insert(#[from] SinkError),
}

/// Top-level error type for changetrail.
#[derive(Debug, Error)]
pub enum TrailError {
    /// Invalid trigger input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Repository failure.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Log sink failure.
    #[error("Log sink error: {0}")]
    Sink(#[from] SinkError),

    /// Failure while handling one trigger.
    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    /// Unexpected condition, such as a worker that could not be spawned.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable description.
        message: String,
    },
}

impl TrailError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a repository error.
    #[must_use]
    pub const fn is_repository(&self) -> bool {
        matches!(self, Self::Repository(_))
    }

    /// Returns true if this is a log sink error.
    #[must_use]
    pub const fn is_sink(&self) -> bool {
        matches!(self, Self::Sink(_))
    }

    /// Returns true if this is a handler error.
    #[must_use]
    pub const fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for changetrail operations.
pub type TrailResult<T> = Result<T, TrailError>;
