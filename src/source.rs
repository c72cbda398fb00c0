//! The decoder seam.
//!
//! [`VideoSource`] is the forward-only frame cursor the pipeline pulls from.
//! [`VideoFile`](crate::VideoFile) implements it on top of FFmpeg; anything
//! else that can hand out [`Frame`]s in display order can be plugged into
//! [`ExtractionPipeline::run_with`](crate::ExtractionPipeline::run_with).

use crate::frame::Frame;

/// Stream properties read when the source is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Frame count reported by the container (may be an estimate).
    pub total_frames: u64,
    /// Average frame rate, `0.0` if unknown.
    pub frames_per_second: f64,
    /// Decoder name, e.g. `h264`.
    pub codec: String,
}

/// A lazy, finite, forward-only sequence of decoded frames.
pub trait VideoSource {
    fn info(&self) -> &VideoInfo;

    /// Frames the container announced. `0` means the file is unusable.
    fn total_frames(&self) -> u64 {
        self.info().total_frames
    }

    /// Decode the next frame in display order.
    ///
    /// Returns `None` at end of stream, and also when a mid-stream decode
    /// error makes further progress impossible. Callers stop at the first
    /// `None`.
    fn next_frame(&mut self) -> Option<Frame>;

    /// Release decoder and demuxer resources. Idempotent.
    fn close(&mut self);
}
