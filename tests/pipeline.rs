//! ExtractionPipeline integration tests.
//!
//! These drive the pipeline with an in-memory video source, so they need no
//! media fixtures.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use framesplit::{
    CancellationToken, ErrorKind, ExtractError, ExtractOptions, ExtractionPipeline,
    ExtractionReport, Frame, PipelineState, PixelLayout, ProgressCallback, ProgressEvent,
    VideoInfo, VideoSource,
};

type FrameHook = Box<dyn FnMut(u64)>;

/// Yields `available` tiny BGR frames while announcing `announced` frames.
struct SyntheticVideo {
    info: VideoInfo,
    available: u64,
    produced: u64,
    closed: Arc<AtomicBool>,
    before_frame: Option<FrameHook>,
}

impl SyntheticVideo {
    fn new(announced: u64, available: u64) -> Self {
        Self {
            info: VideoInfo {
                width: 2,
                height: 2,
                total_frames: announced,
                frames_per_second: 25.0,
                codec: "synthetic".to_string(),
            },
            available,
            produced: 0,
            closed: Arc::new(AtomicBool::new(false)),
            before_frame: None,
        }
    }

    fn with_hook(mut self, hook: impl FnMut(u64) + 'static) -> Self {
        self.before_frame = Some(Box::new(hook));
        self
    }

    fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

impl VideoSource for SyntheticVideo {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if self.closed.load(Ordering::SeqCst) || self.produced >= self.available {
            return None;
        }
        let index = self.produced;
        if let Some(hook) = self.before_frame.as_mut() {
            hook(index);
        }
        self.produced += 1;

        // Blue channel first: the writer must swap it into the last slot.
        let shade = index as u8;
        let data = [shade, 0, 255].repeat(4);
        Frame::new(2, 2, PixelLayout::Bgr24, data)
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
    summaries: Mutex<Vec<ExtractionReport>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn on_summary(&self, report: &ExtractionReport) {
        self.summaries.lock().unwrap().push(report.clone());
    }
}

fn fake_source(directory: &Path) -> PathBuf {
    let path = directory.join("clip.mp4");
    fs::write(&path, b"stand-in for a real container").unwrap();
    path
}

fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn expected_names(count: u64) -> Vec<String> {
    (0..count).map(framesplit::writer::frame_file_name).collect()
}

// ── successful runs ────────────────────────────────────────────────

#[test]
fn every_frame_becomes_a_numbered_png() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");

    let video = SyntheticVideo::new(12, 12);
    let closed = video.closed_flag();

    let mut pipeline = ExtractionPipeline::default();
    let report = pipeline
        .run_with(&source, &output, move |_| Ok(video))
        .expect("run should complete");

    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert_eq!(report.frames_processed, 12);
    assert_eq!(report.frames_expected, 12);
    assert!(report.failures.is_empty());
    assert!(report.is_complete());
    assert!(closed.load(Ordering::SeqCst), "source must be closed");
    assert_eq!(file_names(&output), expected_names(12));
}

#[test]
fn frames_are_written_in_rgb_order() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");

    ExtractionPipeline::default()
        .run_with(&source, &output, |_| Ok(SyntheticVideo::new(3, 3)))
        .unwrap();

    let image = image::open(output.join("frame_0002.png")).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (2, 2));
    assert_eq!(image.get_pixel(1, 1).0, [255, 0, 2]);
}

#[test]
fn rerun_reproduces_identical_files() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let first = temporary_directory.path().join("first");
    let second = temporary_directory.path().join("second");

    let mut pipeline = ExtractionPipeline::default();
    pipeline
        .run_with(&source, &first, |_| Ok(SyntheticVideo::new(5, 5)))
        .unwrap();
    pipeline
        .run_with(&source, &second, |_| Ok(SyntheticVideo::new(5, 5)))
        .unwrap();

    assert_eq!(file_names(&first), file_names(&second));
    for name in file_names(&first) {
        assert_eq!(
            fs::read(first.join(&name)).unwrap(),
            fs::read(second.join(&name)).unwrap(),
            "{name} differs between runs",
        );
    }
}

#[test]
fn short_stream_completes_with_partial_output() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");

    let mut pipeline = ExtractionPipeline::default();
    let report = pipeline
        .run_with(&source, &output, |_| Ok(SyntheticVideo::new(10, 6)))
        .unwrap();

    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert_eq!(report.frames_processed, 6);
    assert_eq!(report.frames_expected, 10);
    assert!(!report.is_complete());
    assert_eq!(file_names(&output), expected_names(6));
}

// ── fatal errors ───────────────────────────────────────────────────

#[test]
fn zero_frame_video_aborts_without_writing() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");

    let video = SyntheticVideo::new(0, 3);
    let closed = video.closed_flag();

    let mut pipeline = ExtractionPipeline::default();
    let error = pipeline
        .run_with(&source, &output, move |_| Ok(video))
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::EmptyVideo);
    assert_eq!(pipeline.state(), PipelineState::Aborted);
    assert!(closed.load(Ordering::SeqCst), "source must be closed on abort");
    assert!(file_names(&output).is_empty());
}

#[test]
fn empty_inputs_have_no_side_effects() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let output = temporary_directory.path().join("frames");
    let opened = Arc::new(AtomicBool::new(false));

    let flag = opened.clone();
    let mut pipeline = ExtractionPipeline::default();
    let error = pipeline
        .run_with("", &output, move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(SyntheticVideo::new(1, 1))
        })
        .unwrap_err();

    assert_eq!(error, ExtractError::MissingInputs);
    assert_eq!(pipeline.state(), PipelineState::Aborted);
    assert!(!opened.load(Ordering::SeqCst));
    assert!(!output.exists());
}

#[test]
fn missing_source_creates_no_directory() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = temporary_directory.path().join("missing.mp4");
    let output = temporary_directory.path().join("frames");

    let mut pipeline = ExtractionPipeline::default();
    let error = pipeline
        .run_with(&source, &output, |_| Ok(SyntheticVideo::new(1, 1)))
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::MissingSource);
    assert!(!output.exists());
}

#[test]
fn unopenable_container_aborts() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");

    let mut pipeline = ExtractionPipeline::default();
    let error = pipeline
        .run_with(&source, &output, |path: &Path| -> Result<SyntheticVideo, _> {
            Err(ExtractError::UnopenableContainer {
                path: path.to_path_buf(),
                reason: "unsupported codec".to_string(),
            })
        })
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UnopenableContainer);
    assert!(error.remediation().is_some());
    assert_eq!(pipeline.state(), PipelineState::Aborted);
}

// ── per-frame failures ─────────────────────────────────────────────

#[test]
fn output_lost_mid_run_records_remaining_frames() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");
    let relocated = temporary_directory.path().join("relocated");

    // Pull the directory away right before frame 5 is decoded, as an
    // ejected drive or an external `mv` would.
    let (from, to) = (output.clone(), relocated.clone());
    let video = SyntheticVideo::new(10, 10).with_hook(move |index| {
        if index == 5 {
            fs::rename(&from, &to).unwrap();
        }
    });

    let mut pipeline = ExtractionPipeline::default();
    let report = pipeline
        .run_with(&source, &output, move |_| Ok(video))
        .expect("per-frame failures must not abort the run");

    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert_eq!(report.frames_processed, 10);
    assert_eq!(report.frames_written(), 5);
    assert_eq!(file_names(&relocated), expected_names(5));

    let failed: Vec<u64> = report.failures.iter().map(|f| f.frame_index).collect();
    assert_eq!(failed, vec![5, 6, 7, 8, 9]);
    for failure in &report.failures {
        assert_eq!(failure.error.kind(), ErrorKind::OutputNotWritable);
        assert_eq!(
            failure.path,
            output.join(framesplit::writer::frame_file_name(failure.frame_index))
        );
    }
}

#[cfg(unix)]
#[test]
fn output_made_read_only_mid_run_records_remaining_frames() {
    use std::os::unix::fs::PermissionsExt;

    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");

    // Root ignores permission bits; nothing to observe there.
    fs::create_dir(&output).unwrap();
    fs::set_permissions(&output, fs::Permissions::from_mode(0o555)).unwrap();
    let ignores_permissions = framesplit::validation::probe_writable(&output).is_ok();
    fs::set_permissions(&output, fs::Permissions::from_mode(0o755)).unwrap();
    if ignores_permissions {
        return;
    }

    let locked = output.clone();
    let video = SyntheticVideo::new(10, 10).with_hook(move |index| {
        if index == 5 {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        }
    });

    let mut pipeline = ExtractionPipeline::default();
    let result = pipeline.run_with(&source, &output, move |_| Ok(video));
    fs::set_permissions(&output, fs::Permissions::from_mode(0o755)).unwrap();
    let report = result.expect("per-frame failures must not abort the run");

    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert_eq!(report.frames_processed, 10);
    assert_eq!(file_names(&output), expected_names(5));

    let failed: Vec<u64> = report.failures.iter().map(|f| f.frame_index).collect();
    assert_eq!(failed, vec![5, 6, 7, 8, 9]);
    assert!(
        report
            .failures
            .iter()
            .all(|failure| failure.error.kind() == ErrorKind::OutputNotWritable)
    );
}

#[test]
fn encode_failure_skips_only_that_frame() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");

    // A directory squatting on the target name makes the final rename fail.
    let squatter = output.join(framesplit::writer::frame_file_name(3));
    fs::create_dir_all(&squatter).unwrap();

    let video = SyntheticVideo::new(8, 8);
    let mut pipeline = ExtractionPipeline::default();
    let report = pipeline
        .run_with(&source, &output, move |_| Ok(video))
        .expect("per-frame failures must not abort the run");

    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert_eq!(report.frames_processed, 8);
    assert_eq!(report.frames_written(), 7);

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.frame_index, 3);
    assert_eq!(failure.path, squatter);
    assert_eq!(failure.error.kind(), ErrorKind::FrameWriteFailed);
    assert!(!failure.error.is_fatal());

    assert!(squatter.is_dir());
    for index in (0..8).filter(|&index| index != 3) {
        assert!(output.join(framesplit::writer::frame_file_name(index)).is_file());
    }
    assert!(
        file_names(&output)
            .iter()
            .all(|name| !name.ends_with(".partial"))
    );
}

// ── progress & cancellation ────────────────────────────────────────

#[test]
fn progress_fires_every_ten_frames_then_once_at_the_end() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");

    let recorder = Arc::new(RecordingProgress::default());
    let options = ExtractOptions::new().with_progress(recorder.clone());

    ExtractionPipeline::new(options)
        .run_with(&source, &output, |_| Ok(SyntheticVideo::new(25, 25)))
        .unwrap();

    let events = recorder.events.lock().unwrap();
    let intermediate: Vec<u64> = events
        .iter()
        .filter(|event| !event.is_final)
        .map(|event| event.processed)
        .collect();
    assert_eq!(intermediate, vec![10, 20]);

    let last = events.last().unwrap();
    assert!(last.is_final);
    assert_eq!((last.processed, last.total), (25, 25));

    let summaries = recorder.summaries.lock().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].frames_processed, 25);
}

#[test]
fn aborted_run_emits_no_summary() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");

    let recorder = Arc::new(RecordingProgress::default());
    let options = ExtractOptions::new().with_progress(recorder.clone());

    let result = ExtractionPipeline::new(options)
        .run_with(&source, &output, |_| Ok(SyntheticVideo::new(0, 0)));

    assert!(result.is_err());
    assert!(recorder.events.lock().unwrap().is_empty());
    assert!(recorder.summaries.lock().unwrap().is_empty());
}

#[test]
fn cancellation_stops_after_current_frame() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let source = fake_source(temporary_directory.path());
    let output = temporary_directory.path().join("frames");

    let token = CancellationToken::new();
    let trigger = token.clone();
    let video = SyntheticVideo::new(10, 10).with_hook(move |index| {
        if index == 3 {
            trigger.cancel();
        }
    });
    let closed = video.closed_flag();

    let mut pipeline = ExtractionPipeline::new(ExtractOptions::new().with_cancellation(token));
    let report = pipeline.run_with(&source, &output, move |_| Ok(video)).unwrap();

    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert!(report.cancelled);
    assert_eq!(report.frames_processed, 4);
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(file_names(&output), expected_names(4));
}
