//! Coalescing scheduler: the tracker's single consumer.
//!
//! Inbound triggers are merged into a pending batch keyed by
//! `(kind, entity_id)`, keeping only the latest per entity. A ticker drains
//! the batch; a stop signal sweeps the inbox, drains once more and exits.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{select, tick, Receiver};
use tracing::{debug, error, info, warn};

use crate::cache::SnapshotCaches;
use crate::error::HandlerError;
use crate::handler::{Outcome, TrailHandler};
use crate::trigger::{Trigger, TriggerKey};

use super::lifecycle::Lifecycle;
use super::stats::{bump, Counters};

/// Latest pending trigger per entity.
#[derive(Debug, Default)]
pub(crate) struct PendingBatch {
    by_key: HashMap<TriggerKey, Trigger>,
}

impl PendingBatch {
    /// Insert or replace. Returns true if an earlier trigger was replaced.
    pub(crate) fn upsert(&mut self, trigger: Trigger) -> bool {
        self.by_key.insert(trigger.key(), trigger).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Trigger> {
        self.by_key.drain().map(|(_, t)| t).collect()
    }
}

/// Per-drain tallies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DrainReport {
    pub(crate) handled: usize,
    pub(crate) logged: usize,
    pub(crate) failed: usize,
}

#[derive(Debug)]
pub(crate) enum Control {
    Stop,
}

pub(crate) struct Scheduler {
    handler: TrailHandler,
    caches: Arc<Mutex<SnapshotCaches>>,
    pending: PendingBatch,
    lifecycle: Arc<Lifecycle>,
    counters: Arc<Counters>,
}

impl Scheduler {
    pub(crate) fn new(
        handler: TrailHandler,
        caches: Arc<Mutex<SnapshotCaches>>,
        lifecycle: Arc<Lifecycle>,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            handler,
            caches,
            pending: PendingBatch::default(),
            lifecycle,
            counters,
        }
    }

    pub(crate) fn admit(&mut self, trigger: Trigger) {
        if self.pending.upsert(trigger) {
            bump(&self.counters.coalesced);
        }
    }

    /// Dispatch every pending trigger, then clear the batch.
    ///
    /// A failing or panicking entry is skipped; its siblings still run.
    pub(crate) fn drain(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        if self.pending.is_empty() {
            return report;
        }

        let batch = self.pending.take();
        bump(&self.counters.drains);

        let mut caches = self.caches.lock().unwrap_or_else(PoisonError::into_inner);
        for trigger in &batch {
            report.handled += 1;
            bump(&self.counters.handled);

            let result = panic::catch_unwind(AssertUnwindSafe(|| self.handler.handle(&mut caches, trigger)));
            match result {
                Ok(Ok(Outcome::Logged { entry })) => {
                    report.logged += 1;
                    bump(&self.counters.logged);
                    debug!(kind = %trigger.kind(), id = %trigger.entity_id(), %entry, "audit entry written");
                }
                Ok(Ok(Outcome::Ignored)) => bump(&self.counters.ignored),
                Ok(Ok(Outcome::Baseline | Outcome::Unchanged)) => {}
                Ok(Err(err)) => {
                    report.failed += 1;
                    match &err {
                        HandlerError::Fetch(_) => bump(&self.counters.fetch_failures),
                        HandlerError::Insert(_) => bump(&self.counters.insert_failures),
                    }
                    warn!(
                        kind = %trigger.kind(),
                        id = %trigger.entity_id(),
                        action = %trigger.action(),
                        error = %err,
                        "skipping trigger"
                    );
                }
                Err(_) => {
                    report.failed += 1;
                    bump(&self.counters.panics);
                    error!(
                        kind = %trigger.kind(),
                        id = %trigger.entity_id(),
                        action = %trigger.action(),
                        "handler panicked, skipping trigger"
                    );
                }
            }
        }
        drop(caches);

        info!(
            handled = report.handled,
            logged = report.logged,
            failed = report.failed,
            "drained pending triggers"
        );
        report
    }

    /// Second phase of shutdown: sweep what is already queued, drain, exit.
    pub(crate) fn finish(&mut self, inbox: &Receiver<Trigger>) -> DrainReport {
        self.lifecycle.wait_for_permits();

        let mut swept = 0usize;
        while let Ok(trigger) = inbox.try_recv() {
            self.admit(trigger);
            swept += 1;
        }
        debug!(swept, pending = self.pending.len(), "final sweep");

        let report = self.drain();
        self.lifecycle.mark_stopped();
        report
    }

    /// Worker thread body.
    pub(crate) fn run(mut self, inbox: Receiver<Trigger>, control: Receiver<Control>, flush_interval: Duration) {
        let ticker = tick(flush_interval);
        info!(flush_interval_ms = flush_interval.as_millis() as u64, "change tracker worker started");

        loop {
            select! {
                recv(inbox) -> msg => {
                    match msg {
                        Ok(trigger) => self.admit(trigger),
                        // Every producer handle is gone.
                        Err(_) => break,
                    }
                }
                recv(ticker) -> _ => {
                    self.drain();
                }
                recv(control) -> msg => {
                    match msg {
                        Ok(Control::Stop) | Err(_) => break,
                    }
                }
            }
        }

        self.finish(&inbox);
        info!("change tracker worker stopped");
    }
}
