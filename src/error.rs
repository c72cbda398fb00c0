//! Error types for the `framesplit` crate.
//!
//! This module defines [`ExtractError`], the unified error type returned by
//! every fallible operation in the crate, and [`ErrorKind`], its payload-free
//! discriminant. Errors carry the path (and frame index where relevant) plus
//! the upstream reason as text, so they can be cloned into an
//! [`ExtractionReport`](crate::ExtractionReport) and shown to an operator
//! without extra logging at the call site.

use std::path::PathBuf;

use thiserror::Error;

/// Hint shown when FFmpeg cannot open or decode a container.
pub const UNOPENABLE_CONTAINER_HINT: &str = "Possible causes: the path contains non-ASCII or special \
characters, the codec is not supported, or the file is corrupt. Try moving the file to a \
path without special characters, or re-encode it to a widely supported format such as MP4 \
(H.264).";

/// Hint shown when the output directory rejects writes.
pub const OUTPUT_NOT_WRITABLE_HINT: &str = "Choose a directory you can write to, for example a \
folder on your Desktop or ./output_frames next to the video.";

/// Hint shown when a single frame could not be written.
pub const FRAME_WRITE_HINT: &str = "Possible causes: the disk is full, file permissions changed, \
the image could not be encoded, or antivirus software blocked the write.";

/// Payload-free classification of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The source path or the output directory was empty.
    MissingInputs,
    /// The source path does not reference an existing file.
    MissingSource,
    /// The output directory could not be created or rejected a write probe.
    OutputNotWritable,
    /// The decoder could not initialise for the source container.
    UnopenableContainer,
    /// The container reports zero frames.
    EmptyVideo,
    /// A single frame could not be encoded or written.
    FrameWriteFailed,
}

/// The unified error type for all `framesplit` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The source path or output directory was not provided.
    #[error("Select both a video file and an output directory before extracting")]
    MissingInputs,

    /// The video file does not exist.
    #[error("Video file does not exist: {path}")]
    MissingSource {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The output directory cannot receive files.
    #[error("Output directory {path} is not writable: {reason}")]
    OutputNotWritable {
        /// The directory that failed the check.
        path: PathBuf,
        /// Underlying reason the directory was rejected.
        reason: String,
    },

    /// FFmpeg could not open the container or initialise a decoder.
    #[error("Cannot open video file {path}: {reason}. {hint}", hint = UNOPENABLE_CONTAINER_HINT)]
    UnopenableContainer {
        /// The video file that was opened.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The container reports no frames at all.
    #[error("Video {path} reports 0 frames; it is probably invalid or unreadable")]
    EmptyVideo {
        /// The video file that was opened.
        path: PathBuf,
    },

    /// One frame could not be saved.
    #[error("Failed to save frame {frame_index} to {path}: {reason}")]
    FrameWriteFailed {
        /// Index of the frame that failed.
        frame_index: u64,
        /// Target image path.
        path: PathBuf,
        /// Underlying reason the write failed.
        reason: String,
    },
}

impl ExtractError {
    /// The kind of this error, without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::MissingInputs => ErrorKind::MissingInputs,
            ExtractError::MissingSource { .. } => ErrorKind::MissingSource,
            ExtractError::OutputNotWritable { .. } => ErrorKind::OutputNotWritable,
            ExtractError::UnopenableContainer { .. } => ErrorKind::UnopenableContainer,
            ExtractError::EmptyVideo { .. } => ErrorKind::EmptyVideo,
            ExtractError::FrameWriteFailed { .. } => ErrorKind::FrameWriteFailed,
        }
    }

    /// Operator-facing advice for recovering from this error, if any.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            ExtractError::UnopenableContainer { .. } => Some(UNOPENABLE_CONTAINER_HINT),
            ExtractError::OutputNotWritable { .. } => Some(OUTPUT_NOT_WRITABLE_HINT),
            ExtractError::FrameWriteFailed { .. } => Some(FRAME_WRITE_HINT),
            ExtractError::MissingInputs
            | ExtractError::MissingSource { .. }
            | ExtractError::EmptyVideo { .. } => None,
        }
    }

    /// Returns `true` for errors that abort a run when raised before the
    /// frame loop starts.
    ///
    /// `OutputNotWritable` is fatal at start-up but is recorded as a
    /// per-frame failure when the directory goes away mid-run; the pipeline
    /// makes that distinction, not the error itself.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ExtractError::FrameWriteFailed { .. })
    }
}
