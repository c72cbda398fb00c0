//! # framesplit
//!
//! Split a video into one lossless PNG still per frame.
//!
//! `framesplit` decodes a video file front to back with FFmpeg (via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate) and writes
//! every frame to `frame_0000.png`, `frame_0001.png`, … in an output
//! directory, reporting progress along the way.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framesplit::{ExtractOptions, ExtractionPipeline};
//!
//! let mut pipeline = ExtractionPipeline::new(ExtractOptions::new());
//! let report = pipeline.run("input.mp4", "frames")?;
//! println!(
//!     "Processed {} of {} frames, {} failed",
//!     report.frames_processed,
//!     report.frames_expected,
//!     report.failures.len(),
//! );
//! # Ok::<(), framesplit::ExtractError>(())
//! ```
//!
//! ## Failure handling
//!
//! Problems found before the first frame is decoded (missing inputs, a
//! missing or unreadable video, an empty video, an unwritable output
//! directory) abort the run with an [`ExtractError`] whose
//! [`remediation`](ExtractError::remediation) tells the operator what to do.
//!
//! Problems with individual frames (the directory disappearing mid-run, a
//! full disk, an encoder fault) are recorded in the [`ExtractionReport`] and
//! the run continues with the next frame. Frame indices are never reused or
//! skipped, so `frame_0005.png` is always the sixth decoded frame.
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`extract_stream`] runs a pipeline on a blocking thread and yields [`PipelineEvent`]s |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
pub mod validation;
pub mod video_file;
pub mod writer;

pub use config::ExtractOptions;
pub use error::{ErrorKind, ExtractError};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame::{Frame, PixelLayout};
pub use pipeline::{ExtractionPipeline, PipelineState, extract_frames};
pub use progress::{CancellationToken, ProgressCallback, ProgressEvent};
pub use report::{ExtractionReport, FrameFailure};
pub use source::{VideoInfo, VideoSource};
#[cfg(feature = "async")]
pub use stream::{ExtractionStream, PipelineEvent, extract_stream};
pub use validation::{OutputDirectory, SourcePath};
pub use video_file::VideoFile;
pub use writer::FrameWriter;
