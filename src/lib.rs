//! # changetrail - In-process change tracking for an audit trail
//!
//! changetrail turns raw entity-mutation events into human-readable audit
//! entries such as `task.updated:title,priority`. It sits behind the service
//! layer: producers enqueue a trigger after each committed mutation, and a
//! single worker thread coalesces, diffs and logs them in the background.
//!
//! ## Core Concepts
//!
//! - **Trigger**: an immutable event (resource kind, entity id, action, metadata)
//! - **Coalescing**: triggers for one entity collapse to the latest one per flush window
//! - **Snapshot**: the last observed state of an entity, used as the diff baseline
//! - **Drain**: processing every pending trigger as one batch
//!
//! Delivery is best-effort: a full inbox drops triggers, failed fetches or
//! log writes are skipped, and nothing is retried or persisted.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use changetrail::{
//!     Action, ChangeTracker, InMemoryLogSink, InMemoryRepositories, LogSink, Project,
//!     ResourceKind, TrackerConfig,
//! };
//!
//! let repos = InMemoryRepositories::new();
//! let sink = Arc::new(InMemoryLogSink::new());
//! let tracker = ChangeTracker::new(
//!     TrackerConfig::default(),
//!     repos.repositories(),
//!     Arc::clone(&sink) as Arc<dyn LogSink>,
//! )
//! .unwrap();
//!
//! let project = Project::new("apollo");
//! repos.projects.upsert(project.clone()).unwrap();
//! tracker.record(ResourceKind::Project, project.id, Action::Created);
//!
//! // Stop drains everything accepted so far.
//! tracker.stop();
//! assert_eq!(sink.entry_texts(), vec!["project.created"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod diff;
pub mod error;
pub mod handler;
pub mod model;
pub mod storage;
pub mod tracker;
pub mod trigger;

// Re-export primary types at crate root for convenience
pub use cache::{SnapshotCache, SnapshotCaches};
pub use diff::{format_entry, LogRefs, TrackedResource};
pub use error::{HandlerError, RepositoryError, SinkError, TrailError, TrailResult, ValidationError};
pub use handler::{Outcome, TrailHandler};
pub use model::{EntityId, LogCreateModel, LogEntry, Project, Status, Task};
pub use storage::{
    InMemoryLogSink, InMemoryRepositories, JsonLinesLogSink, LogSink, ProjectRepository,
    Repositories, StatusRepository, TaskRepository,
};
pub use tracker::{ChangeTracker, LifecycleState, TrackerConfig, TrackerStats};
pub use trigger::{Action, ResourceKind, Trigger, TriggerKey};
