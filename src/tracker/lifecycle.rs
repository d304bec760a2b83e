//! Running → Stopping → Stopped state machine.

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::thread;

use serde::Serialize;

/// Tracker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Accepting triggers and draining on the timer.
    Running,
    /// Stop requested: new triggers are dropped, the worker is draining.
    Stopping,
    /// Final drain finished; the worker has exited. Terminal.
    Stopped,
}

impl LifecycleState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Stopping => 1,
            Self::Stopped => 2,
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Running,
            1 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Stopping => f.write_str("stopping"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// Shared lifecycle flag read by producers and written by stop/worker.
///
/// Producers hold a [`SendPermit`] guard between the state check and the
/// channel send. The worker waits for outstanding guards before its final
/// sweep, so a trigger that saw `Running` is always in the channel by then.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
    in_flight: AtomicUsize,
}

/// Proof that the tracker was running when a producer started sending.
#[derive(Debug)]
pub(crate) struct SendPermit<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for SendPermit<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Lifecycle {
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Register an in-flight send, or `None` once stop has begun.
    pub(crate) fn try_permit(&self) -> Option<SendPermit<'_>> {
        // Increment before reading the state; both are SeqCst so the worker
        // either sees this count or the producer sees `Stopping`.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let permit = SendPermit {
            in_flight: &self.in_flight,
        };
        self.is_accepting().then_some(permit)
    }

    /// Block until every admitted producer has finished its send.
    pub(crate) fn wait_for_permits(&self) {
        while self.in_flight.load(Ordering::SeqCst) != 0 {
            thread::yield_now();
        }
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn is_accepting(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Running → Stopping. Returns true for exactly one caller.
    pub(crate) fn begin_stop(&self) -> bool {
        self.state
            .compare_exchange(
                LifecycleState::Running.as_u8(),
                LifecycleState::Stopping.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    pub(crate) fn mark_stopped(&self) {
        self.state.store(LifecycleState::Stopped.as_u8(), Ordering::SeqCst);
    }
}
