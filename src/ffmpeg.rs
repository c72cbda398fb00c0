//! FFmpeg initialisation and log level control.
//!
//! FFmpeg has its own logging, separate from the Rust [`log`] facade, and by
//! default prints warnings to stderr. [`set_ffmpeg_log_level`] lets callers
//! quiet it without depending on `ffmpeg-next` directly.

use std::sync::OnceLock;

use ffmpeg_next::util::log::Level;

static FFMPEG_INITIALIZED: OnceLock<Result<(), String>> = OnceLock::new();

/// FFmpeg console verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Only errors.
    Error,
    /// Errors and warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Everything FFmpeg has to say.
    Debug,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }

    /// Parse a level name as typed on the command line.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" | "off" => Some(FfmpegLogLevel::Quiet),
            "error" => Some(FfmpegLogLevel::Error),
            "warning" | "warn" => Some(FfmpegLogLevel::Warning),
            "info" => Some(FfmpegLogLevel::Info),
            "debug" => Some(FfmpegLogLevel::Debug),
            _ => None,
        }
    }
}

/// Set FFmpeg's own log verbosity. Does not affect the `log` crate.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Initialise FFmpeg once per process.
///
/// Later calls return the outcome of the first one.
pub(crate) fn ensure_initialized() -> Result<(), String> {
    FFMPEG_INITIALIZED
        .get_or_init(|| {
            ffmpeg_next::init().map_err(|error| format!("FFmpeg initialisation failed: {error}"))
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_aliases() {
        assert_eq!(FfmpegLogLevel::parse("QUIET"), Some(FfmpegLogLevel::Quiet));
        assert_eq!(FfmpegLogLevel::parse("warn"), Some(FfmpegLogLevel::Warning));
        assert_eq!(FfmpegLogLevel::parse("trace"), None);
    }
}
