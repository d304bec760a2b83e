//! Operability counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time copy of a tracker's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    /// Triggers admitted to the inbox.
    pub accepted: u64,
    /// Triggers rejected as invalid (nil id, unknown kind or action).
    pub rejected: u64,
    /// Triggers dropped because the inbox was full.
    pub dropped_overflow: u64,
    /// Triggers dropped because stop had begun.
    pub dropped_after_stop: u64,
    /// Pending triggers replaced by a later one for the same entity.
    pub coalesced: u64,
    /// Timer and shutdown drains that had work.
    pub drains: u64,
    /// Triggers dispatched to the handler.
    pub handled: u64,
    /// Audit entries written.
    pub logged: u64,
    /// Triggers whose action did not apply to their kind.
    pub ignored: u64,
    /// Triggers skipped because the current state could not be fetched.
    pub fetch_failures: u64,
    /// Audit entries lost because the sink refused them.
    pub insert_failures: u64,
    /// Handler invocations that panicked.
    pub panics: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) accepted: AtomicU64,
    pub(crate) rejected: AtomicU64,
    pub(crate) dropped_overflow: AtomicU64,
    pub(crate) dropped_after_stop: AtomicU64,
    pub(crate) coalesced: AtomicU64,
    pub(crate) drains: AtomicU64,
    pub(crate) handled: AtomicU64,
    pub(crate) logged: AtomicU64,
    pub(crate) ignored: AtomicU64,
    pub(crate) fetch_failures: AtomicU64,
    pub(crate) insert_failures: AtomicU64,
    pub(crate) panics: AtomicU64,
}

pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl Counters {
    pub(crate) fn snapshot(&self) -> TrackerStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        TrackerStats {
            accepted: load(&self.accepted),
            rejected: load(&self.rejected),
            dropped_overflow: load(&self.dropped_overflow),
            dropped_after_stop: load(&self.dropped_after_stop),
            coalesced: load(&self.coalesced),
            drains: load(&self.drains),
            handled: load(&self.handled),
            logged: load(&self.logged),
            ignored: load(&self.ignored),
            fetch_failures: load(&self.fetch_failures),
            insert_failures: load(&self.insert_failures),
            panics: load(&self.panics),
        }
    }
}

impl TrackerStats {
    /// All triggers lost before reaching the worker.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped_overflow + self.dropped_after_stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_fields_are_the_documented_counters() {
        let value = serde_json::to_value(TrackerStats::default()).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();

        let mut expected = vec![
            "accepted",
            "rejected",
            "dropped_overflow",
            "dropped_after_stop",
            "coalesced",
            "drains",
            "handled",
            "logged",
            "ignored",
            "fetch_failures",
            "insert_failures",
            "panics",
        ];
        expected.sort_unstable();
        keys.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn snapshot_reflects_bumps() {
        let counters = Counters::default();
        bump(&counters.dropped_overflow);
        bump(&counters.dropped_overflow);
        bump(&counters.dropped_after_stop);
        bump(&counters.ignored);

        let stats = counters.snapshot();
        assert_eq!(stats.dropped(), 3);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.logged, 0);
    }
}
