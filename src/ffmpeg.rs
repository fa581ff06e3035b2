//! FFmpeg log level configuration.
//!
//! FFmpeg prints to stderr through its own logging system, separate from the
//! [`log`](https://crates.io/crates/log) facade this crate uses. The
//! command-line tool keeps FFmpeg quiet unless the user asks for trace-level
//! verbosity or sets a level explicitly.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::FfmpegLogLevel;
//!
//! flipbook::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ffmpeg_next::util::log::Level;

use crate::error::FlipbookError;

/// FFmpeg internal log verbosity, from silent to chatty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's own default).
    Warning,
    /// Informational messages.
    Info,
    /// Debugging messages.
    Debug,
}

impl FfmpegLogLevel {
    /// Level matching a `-v` verbosity: quiet below 3, debug from 3 on.
    pub fn for_verbosity(verbosity: u8) -> Self {
        if verbosity >= 3 {
            FfmpegLogLevel::Debug
        } else {
            FfmpegLogLevel::Quiet
        }
    }

    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = FlipbookError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "debug" => Ok(FfmpegLogLevel::Debug),
            other => Err(FlipbookError::invalid(
                "FFmpeg log level",
                format!("'{other}' is not one of quiet, error, warning, info, debug"),
            )),
        }
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// Set what FFmpeg itself prints to stderr. Does not affect the `log`
/// facade.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}
