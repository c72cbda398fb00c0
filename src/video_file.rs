//! FFmpeg-backed [`VideoSource`].
//!
//! [`VideoFile`] opens a container, picks its best video stream, and decodes
//! frames on demand. Each call to [`next_frame`](VideoSource::next_frame)
//! reads just enough packets to produce one picture, so the whole video is
//! never buffered.
//!
//! Packed RGB/BGR/gray decoder output is copied in its native channel order;
//! every other pixel format (YUV, planar, high bit depth) is converted to
//! RGB24 with `swscale`.
//!
//! # Example
//!
//! ```no_run
//! use framesplit::{VideoFile, VideoSource};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! println!("{} frames", video.total_frames());
//! while let Some(frame) = video.next_frame() {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! video.close();
//! # Ok::<(), framesplit::ExtractError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{
    error::ExtractError,
    frame::{Frame, PixelLayout},
    source::{VideoInfo, VideoSource},
};

/// An opened video file, decoding forward from its first frame.
pub struct VideoFile {
    path: PathBuf,
    info: VideoInfo,
    /// `None` once the file has been closed.
    decoding: Option<Decoding>,
}

/// Demuxer and decoder state, dropped as a unit on close.
struct Decoding {
    input_context: Input,
    decoder: VideoDecoder,
    video_stream_index: usize,
    converter: RgbConverter,
    decoded_frame: VideoFrame,
    eof_sent: bool,
    finished: bool,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("path", &self.path)
            .field("info", &self.info)
            .field("open", &self.decoding.is_some())
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open `path` and prepare a decoder for its best video stream.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::UnopenableContainer`] if FFmpeg cannot
    /// initialise, the container cannot be parsed, it has no video stream, or
    /// no decoder is available for the codec.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref().to_path_buf();
        let unopenable = |reason: String| ExtractError::UnopenableContainer {
            path: path.clone(),
            reason,
        };

        log::debug!("Opening video file: {}", path.display());

        crate::ffmpeg::ensure_initialized().map_err(unopenable)?;

        let input_context = ffmpeg_next::format::input(&path)
            .map_err(|error| unopenable(error.to_string()))?;

        let (video_stream_index, decoder, frames_per_second, total_frames) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or_else(|| unopenable("no video stream found".to_string()))?;

            let decoder_context = CodecContext::from_parameters(stream.parameters())
                .map_err(|error| unopenable(format!("cannot read codec parameters: {error}")))?;
            let decoder = decoder_context
                .decoder()
                .video()
                .map_err(|error| unopenable(format!("cannot create video decoder: {error}")))?;

            let frames_per_second = rational_to_f64(stream.avg_frame_rate())
                .or_else(|| rational_to_f64(stream.rate()))
                .unwrap_or(0.0);

            let duration_seconds = if stream.duration() > 0 {
                stream.duration() as f64 * rational_to_f64(stream.time_base()).unwrap_or(0.0)
            } else if input_context.duration() > 0 {
                input_context.duration() as f64 / 1_000_000.0
            } else {
                0.0
            };

            let total_frames = if stream.frames() > 0 {
                stream.frames() as u64
            } else {
                (duration_seconds * frames_per_second).round() as u64
            };

            (stream.index(), decoder, frames_per_second, total_frames)
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let info = VideoInfo {
            width: decoder.width(),
            height: decoder.height(),
            total_frames,
            frames_per_second,
            codec,
        };

        log::info!(
            "Opened video {}: {}x{} @ {:.2} fps, codec={}, {} frames",
            path.display(),
            info.width,
            info.height,
            info.frames_per_second,
            info.codec,
            info.total_frames,
        );

        Ok(Self {
            path,
            info,
            decoding: Some(Decoding {
                input_context,
                decoder,
                video_stream_index,
                converter: RgbConverter::new(),
                decoded_frame: VideoFrame::empty(),
                eof_sent: false,
                finished: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` until [`close`](VideoSource::close) is called.
    pub fn is_open(&self) -> bool {
        self.decoding.is_some()
    }
}

impl VideoSource for VideoFile {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Option<Frame> {
        let decoding = self.decoding.as_mut()?;
        if decoding.finished {
            return None;
        }

        match decoding.decode_next() {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => {
                decoding.finished = true;
                None
            }
            Err(reason) => {
                log::warn!(
                    "Decoding of {} stopped early: {reason}",
                    self.path.display()
                );
                decoding.finished = true;
                None
            }
        }
    }

    fn close(&mut self) {
        if self.decoding.take().is_some() {
            log::debug!("Closed video file: {}", self.path.display());
        }
    }
}

impl Decoding {
    /// Pull packets until the decoder yields a frame or the stream ends.
    fn decode_next(&mut self) -> Result<Option<Frame>, String> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return self.convert_current_frame().map(Some);
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder
                            .send_packet(&packet)
                            .map_err(|error| format!("decoder rejected packet: {error}"))?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder
                        .send_eof()
                        .map_err(|error| format!("cannot flush decoder: {error}"))?;
                    self.eof_sent = true;
                }
                Err(error) => return Err(format!("cannot read packet: {error}")),
            }
        }
    }

    fn convert_current_frame(&mut self) -> Result<Frame, String> {
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();
        let format = self.decoded_frame.format();

        if let Some(layout) = native_layout(format) {
            let data = frame_to_buffer(
                &self.decoded_frame,
                width,
                height,
                layout.bytes_per_pixel(),
            );
            return Frame::new(width, height, layout, data)
                .ok_or_else(|| "decoded frame buffer has an unexpected size".to_string());
        }

        self.converter.convert(&self.decoded_frame)
    }
}

/// `swscale` conversion to RGB24, rebuilt whenever the input format or size
/// changes.
struct RgbConverter {
    scaler: Option<((Pixel, u32, u32), ScalingContext)>,
    output: VideoFrame,
}

impl RgbConverter {
    fn new() -> Self {
        Self {
            scaler: None,
            output: VideoFrame::empty(),
        }
    }

    fn convert(&mut self, source: &VideoFrame) -> Result<Frame, String> {
        let width = source.width();
        let height = source.height();
        let format = source.format();

        let key = (format, width, height);
        if self.scaler.as_ref().is_none_or(|(current, _)| *current != key) {
            let context = ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )
            .map_err(|error| format!("cannot convert {format:?} frames to RGB: {error}"))?;
            self.scaler = Some((key, context));
            // `run` only allocates an empty output; a stale size is rejected.
            self.output = VideoFrame::empty();
        }

        let Some((_, scaler)) = self.scaler.as_mut() else {
            return Err("pixel converter unavailable".to_string());
        };
        scaler
            .run(source, &mut self.output)
            .map_err(|error| format!("pixel conversion failed: {error}"))?;

        let data = frame_to_buffer(&self.output, width, height, 3);
        Frame::new(width, height, PixelLayout::Rgb24, data)
            .ok_or_else(|| "converted frame buffer has an unexpected size".to_string())
    }
}

/// Packed formats that can be copied without conversion.
fn native_layout(format: Pixel) -> Option<PixelLayout> {
    match format {
        Pixel::RGB24 => Some(PixelLayout::Rgb24),
        Pixel::BGR24 => Some(PixelLayout::Bgr24),
        Pixel::RGBA => Some(PixelLayout::Rgba32),
        Pixel::BGRA => Some(PixelLayout::Bgra32),
        Pixel::GRAY8 => Some(PixelLayout::Gray8),
        _ => None,
    }
}

fn rational_to_f64(value: Rational) -> Option<f64> {
    (value.numerator() > 0 && value.denominator() > 0)
        .then(|| value.numerator() as f64 / value.denominator() as f64)
}

/// Copy plane 0 of `video_frame` into a buffer without row padding.
fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = width as usize * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * height as usize].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}
