//! Progress reporting for index builds.

use std::sync::Arc;

/// Snapshot emitted after each catalog entry is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
    /// Entries processed so far (embedded or dropped)
    pub completed: usize,

    /// Entries in the catalog
    pub total: usize,

    /// Entries dropped so far
    pub dropped: usize,
}

impl BuildProgress {
    /// Percentage complete (0.0 - 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        format!(
            "[embed] {}/{} ({:.0}%) - {} dropped",
            self.completed,
            self.total,
            self.percentage(),
            self.dropped
        )
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(BuildProgress) + Send + Sync>;

/// Progress reporter that emits events through an optional callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Create a no-op reporter (no events emitted).
    pub fn noop() -> Self {
        Self { callback: None }
    }

    pub fn emit(&self, progress: BuildProgress) {
        tracing::trace!(
            completed = progress.completed,
            total = progress.total,
            dropped = progress.dropped,
            "Build progress"
        );

        if let Some(callback) = &self.callback {
            callback(progress);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}
