//! Per-frame PNG output.
//!
//! [`FrameWriter`] owns the output directory for a run. Every call to
//! [`write`](FrameWriter::write) re-probes the directory, converts the frame
//! to RGB, and encodes it losslessly as `frame_NNNN.png`. The image is first
//! written to a `.partial` sibling and renamed into place, so a failed write
//! never leaves a truncated file under the final name.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use image::ImageFormat;

use crate::{
    error::ExtractError,
    frame::Frame,
    validation::{OutputDirectory, probe_writable},
};

/// File name for the frame at `frame_index`.
///
/// The index is zero-padded to at least four digits; larger indices keep
/// all of their digits.
///
/// ```
/// assert_eq!(framesplit::writer::frame_file_name(7), "frame_0007.png");
/// assert_eq!(framesplit::writer::frame_file_name(12345), "frame_12345.png");
/// ```
pub fn frame_file_name(frame_index: u64) -> String {
    format!("frame_{frame_index:04}.png")
}

/// Writes decoded frames into a single output directory.
#[derive(Debug, Clone)]
pub struct FrameWriter {
    directory: PathBuf,
}

impl FrameWriter {
    pub fn new(directory: &OutputDirectory) -> Self {
        Self {
            directory: directory.as_path().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Target path for `frame_index` inside this writer's directory.
    pub fn frame_path(&self, frame_index: u64) -> PathBuf {
        self.directory.join(frame_file_name(frame_index))
    }

    /// Encode `frame` as `frame_<index>.png` and return the written path.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::OutputNotWritable`] if the directory fails the
    ///   pre-write probe. Nothing is written.
    /// - [`ExtractError::FrameWriteFailed`] if encoding or writing fails.
    ///   Any partial output is removed.
    pub fn write(&self, frame_index: u64, frame: &Frame) -> Result<PathBuf, ExtractError> {
        probe_writable(&self.directory)?;

        let target = self.frame_path(frame_index);
        let partial = target.with_extension("png.partial");

        match encode_png(frame, &partial).and_then(|()| {
            fs::rename(&partial, &target).map_err(|error| format!("rename failed: {error}"))
        }) {
            Ok(()) => {
                log::debug!("Saved frame {frame_index} to {}", target.display());
                Ok(target)
            }
            Err(reason) => {
                let _ = fs::remove_file(&partial);
                Err(ExtractError::FrameWriteFailed {
                    frame_index,
                    path: target,
                    reason,
                })
            }
        }
    }
}

fn encode_png(frame: &Frame, path: &Path) -> Result<(), String> {
    let image = frame
        .to_rgb_image()
        .ok_or_else(|| "frame buffer does not match its dimensions".to_string())?;
    let file = File::create(path).map_err(|error| format!("cannot create file: {error}"))?;
    let mut writer = BufWriter::new(file);
    image
        .write_to(&mut writer, ImageFormat::Png)
        .map_err(|error| format!("PNG encoding failed: {error}"))?;
    writer
        .flush()
        .map_err(|error| format!("flush failed: {error}"))?;
    Ok(())
}
