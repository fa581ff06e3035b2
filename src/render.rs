//! Per-frame still images.
//!
//! [`FrameRenderer`] downscales each source frame to the layout's pixel box
//! and encodes it as a JPEG file inside the run's working directory. The
//! document writer later embeds those files by path.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, codecs::jpeg::JpegEncoder, imageops::FilterType};

use crate::error::FlipbookError;
use crate::geometry::PixelSize;

/// Largest size with the aspect ratio of `source` that fits inside
/// `bounds`, never larger than `source` itself.
///
/// Each dimension is at least 1 pixel.
///
/// # Example
///
/// ```
/// use flipbook::{PixelSize, fit_within};
///
/// let fitted = fit_within(PixelSize::new(1920, 1080), PixelSize::new(420, 236));
/// assert_eq!(fitted, PixelSize::new(420, 236));
///
/// // Small sources are never upscaled.
/// let fitted = fit_within(PixelSize::new(160, 90), PixelSize::new(420, 236));
/// assert_eq!(fitted, PixelSize::new(160, 90));
/// ```
pub fn fit_within(source: PixelSize, bounds: PixelSize) -> PixelSize {
    if source.width == 0 || source.height == 0 {
        return source;
    }
    let scale = (bounds.width as f64 / source.width as f64)
        .min(bounds.height as f64 / source.height as f64)
        .min(1.0);
    PixelSize::new(
        ((source.width as f64 * scale).round() as u32).max(1),
        ((source.height as f64 * scale).round() as u32).max(1),
    )
}

/// Downscales frames and writes them as JPEG files.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    directory: PathBuf,
    bounds: PixelSize,
    quality: u8,
}

impl FrameRenderer {
    /// Create a renderer writing into `directory`, fitting frames into
    /// `bounds`.
    pub fn new(directory: impl Into<PathBuf>, bounds: PixelSize, quality: u8) -> Self {
        Self {
            directory: directory.into(),
            bounds,
            quality: quality.clamp(1, 100),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Aspect-preserving downscale into the pixel box. Frames that already
    /// fit are returned unchanged.
    pub fn downscale(&self, frame: &DynamicImage) -> DynamicImage {
        let source = PixelSize::new(frame.width(), frame.height());
        let target = fit_within(source, self.bounds);
        if target == source {
            return frame.clone();
        }
        frame.resize_exact(target.width, target.height, FilterType::Triangle)
    }

    /// Downscale `frame`, flatten it to RGB and encode it as
    /// `frame-<sequence>.jpg` in the working directory.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::RenderError`] if the file cannot be created or the
    /// encoder fails.
    pub fn render(&self, frame: &DynamicImage, sequence: u64) -> Result<PathBuf, FlipbookError> {
        let render_error = |reason: String| FlipbookError::RenderError { sequence, reason };

        let scaled = self.downscale(frame);
        let rgb = DynamicImage::ImageRgb8(scaled.to_rgb8());
        let path = self.directory.join(format!("frame-{sequence:06}.jpg"));

        let file = File::create(&path)
            .map_err(|error| render_error(format!("cannot create {}: {error}", path.display())))?;
        let mut writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(&mut writer, self.quality);
        rgb.write_with_encoder(encoder)
            .map_err(|error| render_error(error.to_string()))?;
        writer
            .flush()
            .map_err(|error| render_error(format!("cannot write {}: {error}", path.display())))?;

        log::trace!(
            "Rendered frame {} at {}x{} -> {}",
            sequence,
            rgb.width(),
            rgb.height(),
            path.display()
        );
        Ok(path)
    }
}
