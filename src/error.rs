//! Error types for the `flipbook` crate.
//!
//! This module defines [`FlipbookError`], the unified error type returned by
//! all fallible operations in the crate, and [`ErrorKind`], the coarse
//! category each variant belongs to. Every category is fatal to a run: there
//! are no retries anywhere in the pipeline.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// Coarse classification of a [`FlipbookError`].
///
/// Configuration and source errors are raised before any output-producing
/// work begins; render and write errors abort a run that is already under
/// way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad paper key, invalid parameter, or a page that fits no tiles.
    Configuration,
    /// The input could not be opened or decoded.
    Source,
    /// A frame could not be downscaled or encoded.
    Render,
    /// The output document could not be assembled or written.
    Write,
}

/// The unified error type for all `flipbook` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlipbookError {
    /// The paper key is not one of the supported sizes.
    #[error("Unknown paper size '{0}' (expected one of: a5, a4, a3, letter, legal)")]
    UnknownPaperSize(String),

    /// A numeric run parameter is out of its valid range.
    #[error("Invalid {name}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Margins leave no printable area on the page.
    #[error("Margins leave no printable area ({width:.2}mm x {height:.2}mm)")]
    NonPositivePrintableArea {
        /// Printable width after subtracting left and right margins.
        width: f64,
        /// Printable height after subtracting top and bottom margins.
        height: f64,
    },

    /// The requested frame size does not fit at least one tile per axis.
    #[error(
        "Frame of {tile_width:.2}mm x {tile_height:.2}mm does not fit into the printable area of \
         {printable_width:.2}mm x {printable_height:.2}mm ({columns} x {rows} tiles)"
    )]
    FrameTooLarge {
        /// Tile width including the binding offset.
        tile_width: f64,
        /// Tile height.
        tile_height: f64,
        /// Printable width of the page.
        printable_width: f64,
        /// Printable height of the page.
        printable_height: f64,
        /// Number of columns that would fit.
        columns: u32,
        /// Number of rows that would fit.
        rows: u32,
    },

    /// The source file could not be opened.
    #[error("Failed to open source file at {path}: {reason}")]
    FileOpen {
        /// Path of the source file.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An animated image could not be decoded.
    #[error("Failed to decode animated image: {0}")]
    AnimationDecodeError(String),

    /// The source produced no frames at all.
    #[error("Source contains no frames")]
    EmptySource,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// FFmpeg filter graph setup or processing failed.
    #[error("Filter graph error: {0}")]
    FilterGraphError(String),

    /// Re-encoding the source at the requested frame rate failed.
    #[error("Frame rate conversion failed: {0}")]
    ResampleError(String),

    /// A frame could not be downscaled or written as a still image.
    #[error("Failed to render frame {sequence}: {reason}")]
    RenderError {
        /// Zero-based sequence number of the frame.
        sequence: u64,
        /// Underlying reason.
        reason: String,
    },

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The output document could not be assembled or written.
    #[error("Failed to write document: {0}")]
    DocumentWriteError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),
}

impl FlipbookError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlipbookError::UnknownPaperSize(_)
            | FlipbookError::InvalidParameter { .. }
            | FlipbookError::NonPositivePrintableArea { .. }
            | FlipbookError::FrameTooLarge { .. } => ErrorKind::Configuration,
            FlipbookError::FileOpen { .. }
            | FlipbookError::NoVideoStream
            | FlipbookError::VideoDecodeError(_)
            | FlipbookError::AnimationDecodeError(_)
            | FlipbookError::EmptySource
            | FlipbookError::FfmpegError(_)
            | FlipbookError::FilterGraphError(_)
            | FlipbookError::ResampleError(_) => ErrorKind::Source,
            FlipbookError::RenderError { .. } | FlipbookError::ImageError(_) => ErrorKind::Render,
            FlipbookError::DocumentWriteError(_) | FlipbookError::IoError(_) => ErrorKind::Write,
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        FlipbookError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<FfmpegError> for FlipbookError {
    fn from(error: FfmpegError) -> Self {
        FlipbookError::FfmpegError(error.to_string())
    }
}

impl From<gif::DecodingError> for FlipbookError {
    fn from(error: gif::DecodingError) -> Self {
        FlipbookError::AnimationDecodeError(error.to_string())
    }
}
