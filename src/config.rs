//! Extraction configuration.
//!
//! [`ExtractOptions`] is a builder that threads the progress callback,
//! cancellation token, and reporting cadence into an
//! [`ExtractionPipeline`](crate::ExtractionPipeline) without widening the
//! `run` signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framesplit::{CancellationToken, ExtractOptions, ProgressCallback, ProgressEvent};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, event: &ProgressEvent) {
//!         println!("{}/{} frames", event.processed, event.total);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_progress_interval(25);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::progress::{
    CancellationToken, DEFAULT_PROGRESS_INTERVAL, NoOpProgress, ProgressCallback,
};

/// Operational settings for an extraction run.
///
/// A default-constructed value reports nothing, never cancels, and uses the
/// standard ten-frame progress cadence.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) progress_interval: u64,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("progress_interval", &self.progress_interval)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// A cancelled run stops before decoding the next frame and still
    /// returns a report, with [`cancelled`](crate::ExtractionReport::cancelled)
    /// set.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Fire an intermediate progress event every `interval` frames.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn progress_interval(&self) -> u64 {
        self.progress_interval
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
