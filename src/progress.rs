//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for observing an extraction run,
//! [`ProgressEvent`] for the snapshots it receives, [`CancellationToken`] for
//! cooperative cancellation, and the internal [`ProgressThrottle`] that
//! decides when an intermediate snapshot is due.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framesplit::{
//!     ExtractOptions, ExtractionPipeline, ExtractionReport, ProgressCallback, ProgressEvent,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, event: &ProgressEvent) {
//!         println!("Processing: {}/{} frames", event.processed, event.total);
//!     }
//!
//!     fn on_summary(&self, report: &ExtractionReport) {
//!         println!("Done! Processed {} frames", report.frames_processed);
//!     }
//! }
//!
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! let mut pipeline = ExtractionPipeline::new(options);
//! pipeline.run("input.mp4", "frames")?;
//! # Ok::<(), framesplit::ExtractError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use crate::report::ExtractionReport;

/// Default number of frames between intermediate progress events.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10;

/// A snapshot of extraction progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Frames attempted so far (successful or failed writes).
    pub processed: u64,
    /// Frames the container reported up front.
    pub total: u64,
    /// `processed / total` as a percentage, capped at 100.
    pub percentage: f32,
    /// Wall-clock time since the frame loop started.
    pub elapsed: Duration,
    /// `true` for the unconditional event fired after the loop ends.
    pub is_final: bool,
}

/// Trait for observing an extraction run.
///
/// Implementations must be [`Send`] and [`Sync`] so the same callback can be
/// driven from a background thread (see the `async` feature).
///
/// Callbacks observe but cannot steer the run. Use [`CancellationToken`] to
/// stop it.
pub trait ProgressCallback: Send + Sync {
    /// Called every few frames and once more after the frame loop.
    fn on_progress(&self, event: &ProgressEvent);

    /// Called exactly once with the final report of a completed run.
    fn on_summary(&self, _report: &ExtractionReport) {}
}

/// Discards all notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone it and call [`cancel`](CancellationToken::cancel) from any thread
/// (or a Ctrl-C handler). The pipeline checks the token at the top of each
/// frame iteration and stops after the frame in flight.
///
/// ```
/// use framesplit::CancellationToken;
///
/// let token = CancellationToken::new();
/// let clone = token.clone();
/// clone.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Decides which frame counts produce a [`ProgressEvent`].
///
/// An intermediate event fires whenever `processed` is a multiple of the
/// interval. [`finish`](ProgressThrottle::finish) always produces an event.
#[derive(Debug)]
pub struct ProgressThrottle {
    total: u64,
    interval: u64,
    start_time: Instant,
}

impl ProgressThrottle {
    pub fn new(total: u64, interval: u64) -> Self {
        Self {
            total,
            interval: interval.max(1),
            start_time: Instant::now(),
        }
    }

    /// Event for `processed` frames, if one is due.
    pub fn advance(&self, processed: u64) -> Option<ProgressEvent> {
        (processed > 0 && processed % self.interval == 0).then(|| self.event(processed, false))
    }

    /// The unconditional terminal event.
    pub fn finish(&self, processed: u64) -> ProgressEvent {
        self.event(processed, true)
    }

    fn event(&self, processed: u64, is_final: bool) -> ProgressEvent {
        let percentage = if self.total > 0 {
            ((processed as f32 / self.total as f32) * 100.0).min(100.0)
        } else {
            0.0
        };

        ProgressEvent {
            processed,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
            is_final,
        }
    }
}
