// Performance metrics module
//
// Lightweight counters for monitoring application behavior across a session

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Global performance metrics
///
/// Uses atomic operations for thread-safe tracking without locks. Counters
/// accumulate over the application lifetime and are logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Builds that produced the expected executable
    pub builds_succeeded: AtomicUsize,

    /// Builds that failed for any reason
    pub builds_failed: AtomicUsize,

    /// Total wall-clock build time in milliseconds
    pub total_build_time_ms: AtomicU64,

    /// Tool output lines relayed to the console view
    pub log_lines_relayed: AtomicU64,

    /// UI updates sent through the bridge
    pub ui_updates: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            builds_succeeded: AtomicUsize::new(0),
            builds_failed: AtomicUsize::new(0),
            total_build_time_ms: AtomicU64::new(0),
            log_lines_relayed: AtomicU64::new(0),
            ui_updates: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a successful build
    pub fn record_build_succeeded(&self) {
        self.builds_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed build
    pub fn record_build_failed(&self) {
        self.builds_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record wall-clock time of a build
    pub fn record_build_time(&self, duration: Duration) {
        self.total_build_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record one relayed tool output line
    pub fn record_log_line(&self) {
        self.log_lines_relayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a UI update
    pub fn record_ui_update(&self) {
        self.ui_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average build time in milliseconds across all completed builds
    pub fn avg_build_time_ms(&self) -> f64 {
        let total = self.total_build_time_ms.load(Ordering::Relaxed);
        let count = self.builds_succeeded.load(Ordering::Relaxed)
            + self.builds_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Builds: {} succeeded, {} failed (avg {:.0}ms)",
            self.builds_succeeded.load(Ordering::Relaxed),
            self.builds_failed.load(Ordering::Relaxed),
            self.avg_build_time_ms()
        );
        tracing::info!(
            "Relayed {} tool output lines, {} UI updates",
            self.log_lines_relayed.load(Ordering::Relaxed),
            self.ui_updates.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.builds_succeeded.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.builds_failed.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_build_outcomes() {
        let metrics = Metrics::new();

        metrics.record_build_succeeded();
        metrics.record_build_succeeded();
        metrics.record_build_failed();

        assert_eq!(metrics.builds_succeeded.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.builds_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_avg_build_time() {
        let metrics = Metrics::new();

        metrics.record_build_succeeded();
        metrics.record_build_time(Duration::from_millis(100));
        metrics.record_build_failed();
        metrics.record_build_time(Duration::from_millis(300));

        assert_eq!(metrics.total_build_time_ms.load(Ordering::Relaxed), 400);
        assert_eq!(metrics.avg_build_time_ms(), 200.0);
    }

    #[test]
    fn test_avg_build_time_no_builds() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_build_time_ms(), 0.0);
    }

    #[test]
    fn test_line_and_ui_counters() {
        let metrics = Metrics::new();

        metrics.record_log_line();
        metrics.record_log_line();
        metrics.record_ui_update();

        assert_eq!(metrics.log_lines_relayed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.ui_updates.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
