//! Change tracker: bounded inbox, coalescing worker and two-phase shutdown.
//!
//! Producers call [`ChangeTracker::enqueue`] right after a mutation commits.
//! The call never blocks and never fails; the worker thread merges triggers
//! per entity and turns them into audit entries on each drain.

mod config;
mod inbox;
mod lifecycle;
mod scheduler;
mod stats;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use tracing::{debug, error, info};

use crate::cache::SnapshotCaches;
use crate::error::{TrailError, TrailResult};
use crate::handler::TrailHandler;
use crate::model::EntityId;
use crate::storage::{LogSink, Repositories};
use crate::trigger::{Action, ResourceKind, Trigger};

pub use config::{TrackerConfig, DEFAULT_FLUSH_INTERVAL, DEFAULT_QUEUE_CAPACITY};
pub use lifecycle::LifecycleState;
pub use stats::TrackerStats;

use inbox::TriggerInbox;
use lifecycle::Lifecycle;
use scheduler::{Control, Scheduler};
use stats::Counters;

/// Change tracker: owns the worker thread, its inbox and its snapshot caches.
///
/// The worker starts in [`ChangeTracker::new`]. [`ChangeTracker::stop`]
/// blocks until every trigger accepted before the stop has been processed;
/// dropping the tracker stops it too.
#[derive(Debug)]
pub struct ChangeTracker {
    cfg: TrackerConfig,
    inbox: TriggerInbox,
    control_tx: Sender<Control>,
    lifecycle: Arc<Lifecycle>,
    counters: Arc<Counters>,
    caches: Arc<Mutex<SnapshotCaches>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl ChangeTracker {
    /// Build a tracker and start its worker.
    ///
    /// # Errors
    ///
    /// Returns `TrailError::Internal` if the worker thread cannot be spawned.
    pub fn new(cfg: TrackerConfig, repos: Repositories, sink: Arc<dyn LogSink>) -> TrailResult<Self> {
        let (inbox_tx, inbox_rx) = bounded::<Trigger>(cfg.effective_queue_capacity());
        let (control_tx, control_rx) = bounded::<Control>(1);

        let lifecycle = Arc::new(Lifecycle::new());
        let counters = Arc::new(Counters::default());
        let caches = Arc::new(Mutex::new(SnapshotCaches::new()));

        let scheduler = Scheduler::new(
            TrailHandler::new(repos, sink),
            Arc::clone(&caches),
            Arc::clone(&lifecycle),
            Arc::clone(&counters),
        );

        let flush_interval = cfg.effective_flush_interval();
        let join = thread::Builder::new()
            .name(cfg.thread_name.clone())
            .spawn(move || scheduler.run(inbox_rx, control_rx, flush_interval))
            .map_err(|e| TrailError::internal(format!("failed to spawn change tracker worker: {e}")))?;

        Ok(Self {
            inbox: TriggerInbox::new(inbox_tx, Arc::clone(&lifecycle), Arc::clone(&counters)),
            cfg,
            control_tx,
            lifecycle,
            counters,
            caches,
            join: Mutex::new(Some(join)),
        })
    }

    /// Fire-and-forget enqueue.
    ///
    /// The trigger is dropped silently if the inbox is full or stop has
    /// begun; see [`ChangeTracker::stats`] for the drop counters.
    pub fn enqueue(&self, trigger: Trigger) {
        self.inbox.offer(trigger);
    }

    /// Build and enqueue a trigger without metadata.
    ///
    /// A nil id is counted as rejected.
    pub fn record(&self, kind: ResourceKind, entity_id: EntityId, action: Action) {
        match Trigger::new(kind, entity_id, action) {
            Ok(trigger) => self.enqueue(trigger),
            Err(_) => self.inbox.reject(),
        }
    }

    /// Enqueue from wire strings.
    ///
    /// Invalid input (empty or unknown kind, unknown action, nil id) is
    /// counted as rejected rather than reported.
    pub fn enqueue_raw(&self, kind: &str, entity_id: EntityId, action: &str, metadata: BTreeMap<String, String>) {
        let parsed = kind.parse::<ResourceKind>().and_then(|kind| {
            let action = action.parse::<Action>()?;
            Trigger::with_metadata(kind, entity_id, action, metadata)
        });
        match parsed {
            Ok(trigger) => self.enqueue(trigger),
            Err(err) => {
                debug!(%kind, %action, error = %err, "rejecting trigger");
                self.inbox.reject();
            }
        }
    }

    /// Stop accepting triggers, drain everything already accepted, and wait
    /// for the worker to exit.
    ///
    /// Idempotent. Concurrent callers all return once the single shutdown
    /// sequence has finished.
    pub fn stop(&self) {
        if self.lifecycle.begin_stop() {
            info!("stopping change tracker");
            // Capacity 1 and a single sender call: never blocks.
            let _ = self.control_tx.send(Control::Stop);
        }

        let mut join = self.join.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = join.take() {
            if handle.join().is_err() {
                error!("change tracker worker panicked during shutdown");
            }
            self.lifecycle.mark_stopped();
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Snapshot of the operability counters.
    #[must_use]
    pub fn stats(&self) -> TrackerStats {
        self.counters.snapshot()
    }

    /// The configuration this tracker was built with.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.cfg
    }

    /// Number of cached snapshots for a kind.
    ///
    /// Blocks while a drain is in progress.
    #[must_use]
    pub fn snapshot_count(&self, kind: ResourceKind) -> usize {
        self.caches.lock().unwrap_or_else(PoisonError::into_inner).count(kind)
    }

    /// Whether a snapshot is cached for `(kind, id)`.
    #[must_use]
    pub fn has_snapshot(&self, kind: ResourceKind, id: EntityId) -> bool {
        self.caches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(kind, id)
    }
}

impl Drop for ChangeTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
