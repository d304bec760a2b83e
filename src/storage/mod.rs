//! Collaborator traits and reference backends.
//!
//! Repositories supply authoritative current state; the log sink receives
//! audit entries. Production hosts plug in their own implementations.

mod jsonl;
mod memory;
mod traits;

pub use jsonl::JsonLinesLogSink;
pub use memory::{
    InMemoryLogSink, InMemoryProjectRepository, InMemoryRepositories, InMemoryRepository,
    InMemoryStatusRepository, InMemoryTaskRepository,
};
pub use traits::{LogSink, ProjectRepository, Repositories, StatusRepository, TaskRepository};
