//! Logger metrics for observability
//!
//! Counters describing connection setup and publish outcomes of a single
//! logger instance.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rust_amqp_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_connect_attempt();
/// metrics.record_published();
///
/// assert_eq!(metrics.connect_attempts(), 1);
/// assert_eq!(metrics.published(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Number of times a broker connection was attempted
    connect_attempts: AtomicU64,

    /// Number of connections that came up with their topology declared
    connections_opened: AtomicU64,

    /// Records handed to the broker without error
    published: AtomicU64,

    /// Log calls that ended in an error
    publish_failures: AtomicU64,

    /// Contexts replaced by their text dump
    context_fallbacks: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            connect_attempts: AtomicU64::new(0),
            connections_opened: AtomicU64::new(0),
            published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            context_fallbacks: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn connections_opened(&self) -> u64 {
        self.connections_opened.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn publish_failures(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn context_fallbacks(&self) -> u64 {
        self.context_fallbacks.load(Ordering::Relaxed)
    }

    /// Record a connection attempt, returning the previous count
    #[inline]
    pub fn record_connect_attempt(&self) -> u64 {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_connection_opened(&self) -> u64 {
        self.connections_opened.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_published(&self) -> u64 {
        self.published.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_publish_failure(&self) -> u64 {
        self.publish_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_context_fallback(&self) -> u64 {
        self.context_fallbacks.fetch_add(1, Ordering::Relaxed)
    }

    /// Failure rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been logged yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.publish_failures() as f64;
        let total = self.published() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            connect_attempts: AtomicU64::new(self.connect_attempts()),
            connections_opened: AtomicU64::new(self.connections_opened()),
            published: AtomicU64::new(self.published()),
            publish_failures: AtomicU64::new(self.publish_failures()),
            context_fallbacks: AtomicU64::new(self.context_fallbacks()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.connect_attempts(), 0);
        assert_eq!(metrics.connections_opened(), 0);
        assert_eq!(metrics.published(), 0);
        assert_eq!(metrics.publish_failures(), 0);
        assert_eq!(metrics.context_fallbacks(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_connect_attempt(), 0);
        assert_eq!(metrics.record_connect_attempt(), 1);
        assert_eq!(metrics.connect_attempts(), 2);
    }

    #[test]
    fn test_failure_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_published();
        }
        for _ in 0..10 {
            metrics.record_publish_failure();
        }

        let rate = metrics.failure_rate();
        assert!((9.9..=10.1).contains(&rate), "Failure rate was {}", rate);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_published();

        let snapshot = metrics.clone();
        metrics.record_published();

        assert_eq!(snapshot.published(), 1);
        assert_eq!(metrics.published(), 2);
    }
}
