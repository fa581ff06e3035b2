//! Run configuration.
//!
//! [`FlipbookOptions`] is a builder that carries everything a run needs
//! besides the source itself: paper, margins, frame geometry, output
//! resolution and frame rate, the binding offset, JPEG quality, document
//! metadata, and progress reporting.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{Flipbook, FlipbookError, FlipbookOptions, Margin, PaperSize};
//!
//! let options = FlipbookOptions::new()
//!     .with_paper(PaperSize::A3)
//!     .with_margins(Margin::uniform(12.0))
//!     .with_frame_height(40.0)
//!     .with_dpi(300)
//!     .with_frames_per_second(12)
//!     .with_binding_offset(0.0);
//!
//! Flipbook::open("input.gif")?.create("flip-book.pdf", &options)?;
//! # Ok::<(), FlipbookError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::document::DocumentMetadata;
use crate::error::FlipbookError;
use crate::geometry::Margin;
use crate::paper::PaperSize;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Default frame height in millimetres.
pub const DEFAULT_FRAME_HEIGHT_MM: f64 = 30.0;
/// Default binding offset in millimetres.
pub const DEFAULT_BINDING_OFFSET_MM: f64 = 15.0;
/// Default output resolution.
pub const DEFAULT_DPI: u32 = 200;
/// Default output frame rate for video sources.
pub const DEFAULT_FRAMES_PER_SECOND: u32 = 10;
/// Default JPEG quality for embedded frames.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Configuration for one flip-book run.
///
/// All fields have defaults matching the command-line tool: A4, 10 mm
/// margins, 30 mm frames at 200 dpi, 10 fps, and a 15 mm binding offset.
#[derive(Clone)]
#[must_use]
pub struct FlipbookOptions {
    pub(crate) paper: PaperSize,
    pub(crate) margins: Margin,
    pub(crate) frame_height_mm: f64,
    pub(crate) dpi: u32,
    pub(crate) frames_per_second: u32,
    pub(crate) binding_offset_mm: f64,
    pub(crate) jpeg_quality: u8,
    pub(crate) metadata: DocumentMetadata,
    /// Parent of the per-run temporary directory; the system default when
    /// unset.
    pub(crate) working_directory: Option<PathBuf>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for FlipbookOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FlipbookOptions")
            .field("paper", &self.paper)
            .field("margins", &self.margins)
            .field("frame_height_mm", &self.frame_height_mm)
            .field("dpi", &self.dpi)
            .field("frames_per_second", &self.frames_per_second)
            .field("binding_offset_mm", &self.binding_offset_mm)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("metadata", &self.metadata)
            .field("working_directory", &self.working_directory)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for FlipbookOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FlipbookOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            paper: PaperSize::default(),
            margins: Margin::default(),
            frame_height_mm: DEFAULT_FRAME_HEIGHT_MM,
            dpi: DEFAULT_DPI,
            frames_per_second: DEFAULT_FRAMES_PER_SECOND,
            binding_offset_mm: DEFAULT_BINDING_OFFSET_MM,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            metadata: DocumentMetadata::default(),
            working_directory: None,
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    pub fn with_paper(mut self, paper: PaperSize) -> Self {
        self.paper = paper;
        self
    }

    pub fn with_margins(mut self, margins: Margin) -> Self {
        self.margins = margins;
        self
    }

    /// Set the printed height of each frame. Width follows from the source
    /// aspect ratio.
    pub fn with_frame_height(mut self, millimetres: f64) -> Self {
        self.frame_height_mm = millimetres;
        self
    }

    /// Set the resolution frames are downscaled to.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the output frame rate. Video sources running at a different rate
    /// are re-encoded before pagination; animated images ignore this.
    pub fn with_frames_per_second(mut self, frames_per_second: u32) -> Self {
        self.frames_per_second = frames_per_second;
        self
    }

    /// Set the binding strip width. `0.0` disables sequence labels and the
    /// secondary cut lines.
    pub fn with_binding_offset(mut self, millimetres: f64) -> Self {
        self.binding_offset_mm = millimetres;
        self
    }

    /// Set the JPEG quality (1–100) of embedded frames.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set only the document title, keeping the other metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = title.into();
        self
    }

    /// Create the per-run temporary directory inside `parent` instead of
    /// the system temporary directory.
    pub fn with_working_directory(mut self, parent: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(parent.into());
        self
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn paper(&self) -> PaperSize {
        self.paper
    }

    pub fn margins(&self) -> Margin {
        self.margins
    }

    pub fn frame_height(&self) -> f64 {
        self.frame_height_mm
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    pub fn binding_offset(&self) -> f64 {
        self.binding_offset_mm
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    /// Check the settings that [`compute_layout`](crate::compute_layout)
    /// does not cover.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::InvalidParameter`] for a zero frame rate or a JPEG
    /// quality outside 1–100.
    pub fn validate(&self) -> Result<(), FlipbookError> {
        if self.frames_per_second == 0 {
            return Err(FlipbookError::invalid(
                "frames per second",
                "must be greater than zero",
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(FlipbookError::invalid(
                "JPEG quality",
                format!("{} is outside 1-100", self.jpeg_quality),
            ));
        }
        Ok(())
    }
}
