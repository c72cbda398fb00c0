//! Path validation and writability probing.
//!
//! [`validate_paths`] turns the two operator-supplied strings into a
//! [`SourcePath`] and an [`OutputDirectory`], creating the directory when it
//! does not exist yet. [`probe_writable`] is the create-then-delete marker
//! check that runs at start-up and again before every frame write.
//!
//! The probe is an early warning, not a guarantee: a directory can still
//! change between the probe and the real write, so callers must treat the
//! outcome of the write itself as authoritative.
//!
//! # Example
//!
//! ```no_run
//! use framesplit::validation::validate_paths;
//!
//! let (source, output) = validate_paths("input.mp4", "frames")?;
//! println!("{} -> {}", source.as_path().display(), output.as_path().display());
//! # Ok::<(), framesplit::ExtractError>(())
//! ```

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::ExtractError;

/// File name of the marker written by [`probe_writable`].
pub const PROBE_FILE_NAME: &str = ".framesplit_write_probe.tmp";

/// A video file path that existed at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath(PathBuf);

impl SourcePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// A directory that existed and accepted a write probe at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirectory(PathBuf);

impl OutputDirectory {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Re-run the writability probe against this directory.
    pub fn probe(&self) -> Result<(), ExtractError> {
        probe_writable(&self.0)
    }
}

/// Validate the source file and prepare the output directory.
///
/// Checks run in this order, and each one stops the validation:
///
/// 1. Both paths must be non-empty ([`ExtractError::MissingInputs`]). No
///    filesystem access happens before this check passes.
/// 2. The source must be an existing file ([`ExtractError::MissingSource`]).
///    The output directory is not touched if this fails.
/// 3. The output directory (and its parents) is created if absent, then
///    probed ([`ExtractError::OutputNotWritable`]).
pub fn validate_paths<S, O>(
    source: S,
    output_dir: O,
) -> Result<(SourcePath, OutputDirectory), ExtractError>
where
    S: AsRef<Path>,
    O: AsRef<Path>,
{
    let source = source.as_ref();
    let output_dir = output_dir.as_ref();

    if source.as_os_str().is_empty() || output_dir.as_os_str().is_empty() {
        return Err(ExtractError::MissingInputs);
    }

    if !source.is_file() {
        return Err(ExtractError::MissingSource {
            path: source.to_path_buf(),
        });
    }

    fs::create_dir_all(output_dir).map_err(|error| ExtractError::OutputNotWritable {
        path: output_dir.to_path_buf(),
        reason: format!("cannot create directory: {error}"),
    })?;

    probe_writable(output_dir)?;

    log::debug!(
        "Validated source {} and output directory {}",
        source.display(),
        output_dir.display(),
    );

    Ok((
        SourcePath(source.to_path_buf()),
        OutputDirectory(output_dir.to_path_buf()),
    ))
}

/// Create and remove a marker file in `dir` to check that it accepts writes.
///
/// Fails with [`ExtractError::OutputNotWritable`] if the directory is gone,
/// read-only, full, or otherwise rejects the marker.
pub fn probe_writable(dir: &Path) -> Result<(), ExtractError> {
    let marker = dir.join(PROBE_FILE_NAME);
    let not_writable = |reason: String| ExtractError::OutputNotWritable {
        path: dir.to_path_buf(),
        reason,
    };

    if !dir.is_dir() {
        return Err(not_writable("directory does not exist".to_string()));
    }

    let written = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&marker)
        .and_then(|mut file| file.write_all(b"probe"));

    if let Err(error) = written {
        let _ = fs::remove_file(&marker);
        return Err(not_writable(format!("write probe failed: {error}")));
    }

    fs::remove_file(&marker).map_err(|error| not_writable(format!("cannot remove probe file: {error}")))
}
