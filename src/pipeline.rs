//! The extraction state machine.
//!
//! [`ExtractionPipeline`] validates the two paths, opens the video, then
//! decodes and writes every frame strictly in order:
//!
//! ```text
//! Idle -> Validating -> Opened -> Extracting -> Completed
//!             |            |
//!             +-> Aborted <+
//! ```
//!
//! Failures before the frame loop abort the run and are returned as the
//! error. Failures inside the loop are recorded per frame in the
//! [`ExtractionReport`] and the loop moves on to the next frame.

use std::path::Path;

use crate::{
    config::ExtractOptions,
    error::ExtractError,
    progress::ProgressThrottle,
    report::{ExtractionReport, FrameFailure},
    source::VideoSource,
    validation::{OutputDirectory, validate_paths},
    video_file::VideoFile,
    writer::FrameWriter,
};

/// Lifecycle of one [`ExtractionPipeline::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started yet.
    Idle,
    /// Checking the source file and preparing the output directory.
    Validating,
    /// The source is open and reports at least one frame.
    Opened,
    /// Inside the decode/write loop.
    Extracting,
    /// The frame sequence ended (or the run was cancelled) and the report
    /// is final.
    Completed,
    /// A fatal error stopped the run before the frame loop.
    Aborted,
}

/// Runs frame extraction runs with a fixed set of [`ExtractOptions`].
///
/// # Example
///
/// ```no_run
/// use framesplit::{ExtractOptions, ExtractionPipeline, PipelineState};
///
/// let mut pipeline = ExtractionPipeline::new(ExtractOptions::new());
/// let report = pipeline.run("input.mp4", "frames")?;
/// assert_eq!(pipeline.state(), PipelineState::Completed);
/// println!("{report}");
/// # Ok::<(), framesplit::ExtractError>(())
/// ```
#[derive(Debug)]
pub struct ExtractionPipeline {
    options: ExtractOptions,
    state: PipelineState,
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

impl ExtractionPipeline {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            state: PipelineState::Idle,
        }
    }

    /// State reached by the most recent run.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Extract every frame of `source` into `output_dir` using FFmpeg.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that aborted the run:
    /// [`MissingInputs`](ExtractError::MissingInputs),
    /// [`MissingSource`](ExtractError::MissingSource),
    /// [`OutputNotWritable`](ExtractError::OutputNotWritable),
    /// [`UnopenableContainer`](ExtractError::UnopenableContainer) or
    /// [`EmptyVideo`](ExtractError::EmptyVideo).
    pub fn run<S, O>(&mut self, source: S, output_dir: O) -> Result<ExtractionReport, ExtractError>
    where
        S: AsRef<Path>,
        O: AsRef<Path>,
    {
        self.run_with(source, output_dir, |path| VideoFile::open(path))
    }

    /// Like [`run`](Self::run), but opens the source with `open`.
    ///
    /// `open` is only called once the paths have been validated.
    pub fn run_with<S, O, V, F>(
        &mut self,
        source: S,
        output_dir: O,
        open: F,
    ) -> Result<ExtractionReport, ExtractError>
    where
        S: AsRef<Path>,
        O: AsRef<Path>,
        V: VideoSource,
        F: FnOnce(&Path) -> Result<V, ExtractError>,
    {
        self.transition(PipelineState::Validating);

        let (source, output) = match validate_paths(source, output_dir) {
            Ok(paths) => paths,
            Err(error) => return Err(self.abort(error)),
        };

        let mut video = match open(source.as_path()) {
            Ok(video) => video,
            Err(error) => return Err(self.abort(error)),
        };

        let total_frames = video.total_frames();
        if total_frames == 0 {
            video.close();
            return Err(self.abort(ExtractError::EmptyVideo {
                path: source.as_path().to_path_buf(),
            }));
        }
        self.transition(PipelineState::Opened);

        let report = self.extract(&mut video, &output, total_frames);
        video.close();

        self.transition(PipelineState::Completed);
        log::info!(
            "Extracted {}/{} frames into {} ({} failed)",
            report.frames_processed,
            report.frames_expected,
            report.output_dir.display(),
            report.failures.len(),
        );
        self.options.progress.on_summary(&report);

        Ok(report)
    }

    fn extract<V: VideoSource>(
        &mut self,
        video: &mut V,
        output: &OutputDirectory,
        total_frames: u64,
    ) -> ExtractionReport {
        self.transition(PipelineState::Extracting);

        let writer = FrameWriter::new(output);
        let throttle = ProgressThrottle::new(total_frames, self.options.progress_interval);
        let mut frame_index = 0_u64;
        let mut failures = Vec::new();
        let mut cancelled = false;

        loop {
            if self.options.is_cancelled() {
                log::info!("Extraction cancelled after {frame_index} frames");
                cancelled = true;
                break;
            }

            let Some(frame) = video.next_frame() else {
                break;
            };

            if let Err(error) = writer.write(frame_index, &frame) {
                log::warn!("{error}");
                failures.push(FrameFailure {
                    frame_index,
                    path: writer.frame_path(frame_index),
                    error,
                });
            }
            drop(frame);

            frame_index += 1;
            if let Some(event) = throttle.advance(frame_index) {
                self.options.progress.on_progress(&event);
            }
        }

        let last = throttle.finish(frame_index);
        self.options.progress.on_progress(&last);

        if !cancelled && frame_index < total_frames {
            log::warn!(
                "Video ended after {frame_index} of {total_frames} announced frames"
            );
        }

        ExtractionReport {
            frames_processed: frame_index,
            frames_expected: total_frames,
            failures,
            output_dir: writer.directory().to_path_buf(),
            cancelled,
            elapsed: last.elapsed,
        }
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn abort(&mut self, error: ExtractError) -> ExtractError {
        log::error!("Extraction aborted: {error}");
        self.transition(PipelineState::Aborted);
        error
    }
}

/// Extract every frame of `source` into `output_dir` with `options`.
///
/// Shorthand for `ExtractionPipeline::new(options).run(source, output_dir)`.
pub fn extract_frames<S, O>(
    source: S,
    output_dir: O,
    options: ExtractOptions,
) -> Result<ExtractionReport, ExtractError>
where
    S: AsRef<Path>,
    O: AsRef<Path>,
{
    ExtractionPipeline::new(options).run(source, output_dir)
}
