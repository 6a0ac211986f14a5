//! Progress reporting and the per-run control handle.
//!
//! Progress is a side channel: sinks observe work, they never influence results.

use crate::cancel::CancellationToken;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives progress for one computation.
pub trait ProgressSink: Send + Sync {
    /// Called once per run, before any work, with the expected number of units.
    fn start(&self, total: u64);

    /// One unit of work done.
    fn tick(&self);

    /// Several units of work done.
    fn advance(&self, units: u64) {
        for _ in 0..units {
            self.tick();
        }
    }
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _total: u64) {}
    fn tick(&self) {}
    fn advance(&self, _units: u64) {}
}

/// Thread-safe counter sink.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    total: AtomicU64,
    done: AtomicU64,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let done = self.done.load(Ordering::Relaxed);
        ProgressSnapshot { total, done }
    }
}

impl ProgressSink for ProgressCounter {
    fn start(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
    }

    fn tick(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    fn advance(&self, units: u64) {
        self.done.fetch_add(units, Ordering::Relaxed);
    }
}

/// Point-in-time view of a [`ProgressCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressSnapshot {
    pub total: u64,
    pub done: u64,
}

impl ProgressSnapshot {
    /// Completed fraction in `[0, 1]`; `1.0` when there is nothing to do.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.done as f64 / self.total as f64).min(1.0)
    }
}

/// Expected progress units for a run over `n` nodes.
///
/// Membership scan `n`, distance init `n^2`, relaxation `n^2` (one per `(k, i)`), then `n`
/// each for nearest-distance init, nearest-distance scan and the reciprocal sum. Approximate:
/// a run without a membership column skips the scan.
pub fn total_units(n: usize) -> u64 {
    let n = n as u64;
    n + n * n + n * n + n + n + n
}

/// Cancellation plus progress, threaded through every stage of a run.
#[derive(Clone, Copy)]
pub struct Control<'a> {
    cancel: &'a CancellationToken,
    progress: &'a dyn ProgressSink,
}

impl<'a> Control<'a> {
    pub fn new(cancel: &'a CancellationToken, progress: &'a dyn ProgressSink) -> Self {
        Self { cancel, progress }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[inline]
    pub fn tick(&self) {
        self.progress.tick();
    }

    #[inline]
    pub fn advance(&self, units: u64) {
        self.progress.advance(units);
    }
}

impl std::fmt::Debug for Control<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
