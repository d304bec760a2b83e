//! Bounded multi-producer trigger inbox.
//!
//! Enqueue never blocks: a full inbox or a tracker that is shutting down
//! drops the trigger and bumps a counter.

use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};

use crate::trigger::Trigger;

use super::lifecycle::Lifecycle;
use super::stats::{bump, Counters};

/// What happened to an offered trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Accepted,
    Rejected,
    DroppedOverflow,
    DroppedAfterStop,
}

#[derive(Debug)]
pub(crate) struct TriggerInbox {
    tx: Sender<Trigger>,
    lifecycle: Arc<Lifecycle>,
    counters: Arc<Counters>,
}

impl TriggerInbox {
    pub(crate) fn new(tx: Sender<Trigger>, lifecycle: Arc<Lifecycle>, counters: Arc<Counters>) -> Self {
        Self {
            tx,
            lifecycle,
            counters,
        }
    }

    /// Non-blocking admission.
    pub(crate) fn offer(&self, trigger: Trigger) -> Admission {
        if trigger.entity_id().is_nil() {
            bump(&self.counters.rejected);
            return Admission::Rejected;
        }

        let Some(_permit) = self.lifecycle.try_permit() else {
            bump(&self.counters.dropped_after_stop);
            return Admission::DroppedAfterStop;
        };

        match self.tx.try_send(trigger) {
            Ok(()) => {
                bump(&self.counters.accepted);
                Admission::Accepted
            }
            Err(TrySendError::Full(_)) => {
                bump(&self.counters.dropped_overflow);
                Admission::DroppedOverflow
            }
            Err(TrySendError::Disconnected(_)) => {
                bump(&self.counters.dropped_after_stop);
                Admission::DroppedAfterStop
            }
        }
    }

    pub(crate) fn reject(&self) {
        bump(&self.counters.rejected);
    }
}
