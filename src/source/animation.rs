//! Animated GIFs.
//!
//! A GIF stores sub-frames: rectangles that update part of a logical screen.
//! [`AnimationFrames`] folds each sub-frame onto a full-size canvas with
//! [`composite_canvas`] and yields the whole canvas, so every frame handed
//! to the pagination driver has the size reported by [`SourceInfo`].

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gif::{ColorOutput, DecodeOptions, Decoder};
use image::{DynamicImage, Rgba, RgbaImage};

use super::SourceInfo;
use crate::error::FlipbookError;

/// Colour of the canvas before the first sub-frame is drawn.
const CANVAS_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// One decoded sub-frame, positioned on the logical screen.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDelta {
    /// Left edge on the canvas.
    pub left: u32,
    /// Top edge on the canvas.
    pub top: u32,
    /// Sub-frame pixels. Alpha 0 marks transparent pixels.
    pub image: RgbaImage,
}

/// Draw `delta` over `previous` and return the new canvas.
///
/// Transparent delta pixels leave the canvas unchanged; every other pixel
/// overwrites it. Parts of the delta outside the canvas are clipped.
///
/// # Example
///
/// ```
/// use flipbook::{FrameDelta, composite_canvas};
/// use image::{Rgba, RgbaImage};
///
/// let canvas = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
/// let delta = FrameDelta {
///     left: 1,
///     top: 1,
///     image: RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])),
/// };
///
/// let next = composite_canvas(&canvas, &delta);
/// assert_eq!(next.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
/// assert_eq!(next.get_pixel(2, 2), &Rgba([255, 0, 0, 255]));
/// ```
pub fn composite_canvas(previous: &RgbaImage, delta: &FrameDelta) -> RgbaImage {
    let mut next = previous.clone();
    for (x, y, pixel) in delta.image.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let (canvas_x, canvas_y) = (delta.left + x, delta.top + y);
        if canvas_x < next.width() && canvas_y < next.height() {
            next.put_pixel(canvas_x, canvas_y, *pixel);
        }
    }
    next
}

/// An opened animated GIF.
///
/// Opening decodes the file once to count its frames and sum their delays;
/// [`into_frames`](AnimatedImageSource::into_frames) decodes it again,
/// lazily.
pub struct AnimatedImageSource {
    path: PathBuf,
    info: SourceInfo,
}

impl Debug for AnimatedImageSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnimatedImageSource")
            .field("path", &self.path)
            .field("info", &self.info)
            .finish()
    }
}

impl AnimatedImageSource {
    /// Open `path` and scan its frames.
    ///
    /// # Errors
    ///
    /// - [`FlipbookError::FileOpen`] if the file cannot be opened.
    /// - [`FlipbookError::AnimationDecodeError`] if it is not a valid GIF or
    ///   its logical screen is empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FlipbookError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening animated image: {}", path.display());

        let mut decoder = open_decoder(&path)?;
        let (width, height) = (decoder.width() as u32, decoder.height() as u32);
        if width == 0 || height == 0 {
            return Err(FlipbookError::AnimationDecodeError(format!(
                "logical screen is {width}x{height}"
            )));
        }

        let mut frame_count = 0u64;
        let mut delay_centiseconds = 0u64;
        while let Some(frame) = decoder.read_next_frame()? {
            frame_count += 1;
            delay_centiseconds += frame.delay as u64;
        }

        let info = SourceInfo {
            frame_count,
            frames_per_second: 0.0,
            width,
            height,
            duration: Duration::from_millis(delay_centiseconds * 10),
        };
        log::debug!(
            "Animated image: {}x{}, {} frames, {:?}",
            width,
            height,
            frame_count,
            info.duration
        );
        Ok(Self { path, info })
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start decoding from the first frame.
    ///
    /// # Errors
    ///
    /// The same errors as [`open`](AnimatedImageSource::open), if the file
    /// changed or vanished in between.
    pub fn into_frames(self) -> Result<AnimationFrames, FlipbookError> {
        let decoder = open_decoder(&self.path)?;
        Ok(AnimationFrames {
            decoder,
            canvas: RgbaImage::from_pixel(self.info.width, self.info.height, CANVAS_BACKGROUND),
            done: false,
        })
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, FlipbookError> {
    let file = File::open(path).map_err(|error| FlipbookError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::RGBA);
    Ok(options.read_info(BufReader::new(file))?)
}

/// Lazy iterator over the composited frames of an [`AnimatedImageSource`].
pub struct AnimationFrames {
    decoder: Decoder<BufReader<File>>,
    canvas: RgbaImage,
    done: bool,
}

impl AnimationFrames {
    fn next_delta(&mut self) -> Result<Option<FrameDelta>, FlipbookError> {
        let Some(frame) = self.decoder.read_next_frame()? else {
            return Ok(None);
        };
        let image = RgbaImage::from_raw(
            frame.width as u32,
            frame.height as u32,
            frame.buffer.to_vec(),
        )
        .ok_or_else(|| {
            FlipbookError::AnimationDecodeError(format!(
                "sub-frame of {}x{} has a short pixel buffer",
                frame.width, frame.height
            ))
        })?;
        Ok(Some(FrameDelta {
            left: frame.left as u32,
            top: frame.top as u32,
            image,
        }))
    }
}

impl Iterator for AnimationFrames {
    type Item = Result<DynamicImage, FlipbookError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_delta() {
            Ok(Some(delta)) => {
                self.canvas = composite_canvas(&self.canvas, &delta);
                Some(Ok(DynamicImage::ImageRgba8(self.canvas.clone())))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}
