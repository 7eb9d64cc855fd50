//! Logging setup and submission counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed (tests, embedding apps)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Submission counters for one session
#[derive(Debug, Default)]
pub struct SubmissionMetrics {
    attempts: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    ignored: AtomicU64,
}

impl SubmissionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_started(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "attempts", "Metric incremented");
    }

    pub fn attempt_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "succeeded", "Metric incremented");
    }

    pub fn attempt_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "failed", "Metric incremented");
    }

    pub fn trigger_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "ignored", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub ignored: u64,
}
