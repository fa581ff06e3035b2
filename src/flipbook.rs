//! Core [`Flipbook`] implementation.
//!
//! `Flipbook` is the main entry point for the crate. It opens a source,
//! exposes its [`SourceInfo`], and runs the whole conversion in
//! [`create`](Flipbook::create):
//!
//! 1. validate the options and compute the [`PageLayout`];
//! 2. create a scoped working directory;
//! 3. re-encode the video at the requested frame rate, if needed;
//! 4. stream frames through the pagination driver into a [`PdfDocument`];
//! 5. write the document and remove the working directory.

use std::path::{Path, PathBuf};

use crate::configuration::FlipbookOptions;
use crate::document::{DocumentWriter, PdfDocument};
use crate::error::FlipbookError;
use crate::geometry::{PixelSize, Size};
use crate::layout::{PageLayout, compute_layout};
use crate::paginate::paginate;
use crate::render::FrameRenderer;
use crate::resample::{Resampler, needs_resampling};
use crate::source::{FrameSource, SourceInfo};

/// Prefix of the per-run working directory.
const WORKING_DIRECTORY_PREFIX: &str = "flipbook-";

/// An opened source, ready to be turned into a flip-book.
///
/// # Example
///
/// ```no_run
/// use flipbook::{Flipbook, FlipbookError, FlipbookOptions, PaperSize};
///
/// let flipbook = Flipbook::open("input.mp4")?;
/// println!("{} source frames", flipbook.info().frame_count);
///
/// let summary = flipbook.create(
///     "flip-book.pdf",
///     &FlipbookOptions::new().with_paper(PaperSize::A3),
/// )?;
/// println!("{} frames on {} pages", summary.frames, summary.pages);
/// # Ok::<(), FlipbookError>(())
/// ```
#[derive(Debug)]
pub struct Flipbook {
    source: FrameSource,
    path: PathBuf,
}

/// What a finished run produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipbookSummary {
    /// Frames placed.
    pub frames: u64,
    /// Pages written.
    pub pages: u64,
    /// Tiles per row.
    pub columns: u32,
    /// Tiles per column.
    pub rows: u32,
    /// Printed frame size in millimetres.
    pub frame_size: Size,
    /// Pixel box each frame was downscaled into.
    pub frame_pixels: PixelSize,
    /// Whether the video was re-encoded at a different frame rate.
    pub resampled: bool,
}

impl Flipbook {
    /// Open a video or animated GIF.
    ///
    /// # Errors
    ///
    /// Source errors if the file cannot be opened or decoded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FlipbookError> {
        let path = path.as_ref();
        let source = FrameSource::open(path)?;
        log::info!(
            "Opened {} ({}x{}, {} frame(s))",
            path.display(),
            source.info().width,
            source.info().height,
            source.info().frame_count
        );
        Ok(Self {
            source,
            path: path.to_path_buf(),
        })
    }

    pub fn info(&self) -> &SourceInfo {
        self.source.info()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compute the layout these options give for this source, without
    /// decoding anything.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`FlipbookOptions::validate`] and
    /// [`compute_layout`].
    pub fn layout(&self, options: &FlipbookOptions) -> Result<PageLayout, FlipbookError> {
        options.validate()?;
        compute_layout(
            options.paper,
            options.margins,
            options.frame_height_mm,
            self.info().aspect_ratio(),
            options.dpi,
            options.binding_offset_mm,
        )
    }

    /// Convert the source into a PDF at `output`.
    ///
    /// The output file is only written once every frame has been placed.
    /// Intermediate files live in a temporary directory that is removed
    /// whether the run succeeds or fails. Once the PDF is written, a failure
    /// to remove that directory is only logged.
    ///
    /// # Errors
    ///
    /// Any [`FlipbookError`]; see [`ErrorKind`](crate::ErrorKind) for the
    /// stage each one comes from.
    pub fn create<P: AsRef<Path>>(
        self,
        output: P,
        options: &FlipbookOptions,
    ) -> Result<FlipbookSummary, FlipbookError> {
        let output = output.as_ref();
        let layout = self.layout(options)?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKING_DIRECTORY_PREFIX);
        let working_directory = match &options.working_directory {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        log::debug!("Working directory: {}", working_directory.path().display());

        let requested_rate = options.frames_per_second;
        let mut resampled = false;
        let source = match self.source {
            FrameSource::Video(video)
                if needs_resampling(video.info().frames_per_second, requested_rate) =>
            {
                resampled = true;
                let video = Resampler::new(requested_rate).run(
                    video,
                    working_directory.path(),
                    options.progress.clone(),
                    options.batch_size,
                )?;
                FrameSource::Video(video)
            }
            source => source,
        };
        let expected_frames = source.info().frame_count;

        log::info!(
            "Laying out ~{} frame(s) on {} pages, {}x{} per page",
            expected_frames,
            options.paper,
            layout.columns,
            layout.rows
        );

        let renderer = FrameRenderer::new(
            working_directory.path(),
            layout.frame_pixels,
            options.jpeg_quality,
        );
        let mut document = PdfDocument::new(options.paper, options.metadata.clone());
        let pagination = paginate(
            &layout,
            source.into_frames()?,
            expected_frames,
            &renderer,
            &mut document,
            options,
        )?;
        document.finalize(output)?;
        let working_path = working_directory.path().to_path_buf();
        if let Err(error) = working_directory.close() {
            log::warn!(
                "Failed to remove working directory {}: {}",
                working_path.display(),
                error
            );
        }

        log::info!(
            "Wrote {} frame(s) on {} page(s) to {}",
            pagination.frames,
            pagination.pages,
            output.display()
        );

        Ok(FlipbookSummary {
            frames: pagination.frames,
            pages: pagination.pages,
            columns: layout.columns,
            rows: layout.rows,
            frame_size: layout.frame_size,
            frame_pixels: layout.frame_pixels,
            resampled,
        })
    }
}
