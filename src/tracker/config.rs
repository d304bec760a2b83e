//! Tracker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default inbox capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default period between automatic drains.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for a [`ChangeTracker`](super::ChangeTracker).
///
/// Deserializes from host config files with the flush interval given in
/// milliseconds:
///
/// ```
/// use changetrail::TrackerConfig;
///
/// let cfg: TrackerConfig = serde_json::from_str(r#"{"queue_capacity": 64, "flush_interval_ms": 250}"#).unwrap();
/// assert_eq!(cfg.queue_capacity, 64);
/// assert_eq!(cfg.flush_interval.as_millis(), 250);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Max queued triggers before new ones are dropped.
    pub queue_capacity: usize,
    /// Period between automatic drains.
    #[serde(rename = "flush_interval_ms", with = "duration_ms")]
    pub flush_interval: Duration,
    /// Name of the worker thread.
    pub thread_name: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            thread_name: "changetrail-worker".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Set the inbox capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the drain interval.
    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Set the worker thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Capacity clamped to at least one slot.
    pub(crate) fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Interval clamped to at least one millisecond.
    pub(crate) fn effective_flush_interval(&self) -> Duration {
        self.flush_interval.max(Duration::from_millis(1))
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = TrackerConfig::default();
        assert_eq!(cfg.queue_capacity, 1024);
        assert_eq!(cfg.flush_interval, Duration::from_secs(10));
    }

    #[test]
    fn zero_values_are_clamped() {
        let cfg = TrackerConfig::default()
            .with_queue_capacity(0)
            .with_flush_interval(Duration::ZERO);
        assert_eq!(cfg.effective_queue_capacity(), 1);
        assert_eq!(cfg.effective_flush_interval(), Duration::from_millis(1));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: TrackerConfig = serde_json::from_str(r#"{"flush_interval_ms": 500}"#).unwrap();
        assert_eq!(cfg.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(cfg.flush_interval, Duration::from_millis(500));
        assert_eq!(cfg.thread_name, "changetrail-worker");

        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["flush_interval_ms"], 500);
    }
}
