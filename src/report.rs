//! Final outcome of an extraction run.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ExtractError;

/// A frame whose write attempt failed. The frame's index was still consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFailure {
    pub frame_index: u64,
    /// Where the frame would have been written.
    pub path: PathBuf,
    /// Either [`ExtractError::OutputNotWritable`] or
    /// [`ExtractError::FrameWriteFailed`].
    pub error: ExtractError,
}

/// Summary of a completed run.
///
/// `frames_processed` counts every decode attempt, including frames whose
/// write failed; `frames_written()` gives the number of images on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// Frames decoded and handed to the writer.
    pub frames_processed: u64,
    /// Frames the container reported before decoding.
    pub frames_expected: u64,
    /// Per-frame write failures, in frame order.
    pub failures: Vec<FrameFailure>,
    pub output_dir: PathBuf,
    /// The run stopped early because its cancellation token fired.
    pub cancelled: bool,
    /// Time spent in the frame loop.
    pub elapsed: Duration,
}

impl ExtractionReport {
    /// Number of frames successfully saved.
    pub fn frames_written(&self) -> u64 {
        self.frames_processed
            .saturating_sub(self.failures.len() as u64)
    }

    /// `true` if every expected frame was processed and saved.
    pub fn is_complete(&self) -> bool {
        !self.cancelled
            && self.failures.is_empty()
            && self.frames_processed >= self.frames_expected
    }
}

impl Display for ExtractionReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(
            f,
            "Processed {}/{} frames into {} ({} saved, {} failed) in {:.1}s",
            self.frames_processed,
            self.frames_expected,
            self.output_dir.display(),
            self.frames_written(),
            self.failures.len(),
            self.elapsed.as_secs_f64(),
        )?;
        if self.cancelled {
            writeln!(f, "Extraction was cancelled before the end of the video")?;
        } else if self.frames_processed < self.frames_expected {
            writeln!(
                f,
                "The video ended {} frames earlier than its metadata announced",
                self.frames_expected - self.frames_processed,
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "[FAILED] frame {}: {}", failure.frame_index, failure.error)?;
        }
        Ok(())
    }
}
