//! Frame sources.
//!
//! A [`FrameSource`] is either a video container decoded through FFmpeg or an
//! animated GIF decoded with the `gif` crate. Both are opened eagerly, so
//! their [`SourceInfo`] is known before any frame is decoded, and both are
//! consumed into a lazy, pull-based [`Frames`] iterator yielding full-size
//! frames in display order.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{FlipbookError, FrameSource};
//!
//! let source = FrameSource::open("input.gif")?;
//! println!("{} frames at {}x{}", source.info().frame_count, source.info().width, source.info().height);
//!
//! for frame in source.into_frames()? {
//!     let frame = frame?;
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! # Ok::<(), FlipbookError>(())
//! ```

mod animation;
mod video;

use std::path::Path;
use std::time::Duration;

use image::DynamicImage;

use crate::error::FlipbookError;
use crate::geometry::PixelSize;

pub use animation::{AnimatedImageSource, AnimationFrames, FrameDelta, composite_canvas};
pub use video::{VideoFrames, VideoSource};

/// What is known about a source before decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceInfo {
    /// Number of frames. Exact for animated images, an estimate from
    /// container duration and frame rate for video.
    pub frame_count: u64,
    /// Native frame rate. `0.0` for animated images, which have per-frame
    /// delays instead.
    pub frames_per_second: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Total playback duration.
    pub duration: Duration,
}

impl SourceInfo {
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.size().aspect_ratio()
    }
}

/// A video or animated image to turn into a flip-book.
#[derive(Debug)]
pub enum FrameSource {
    /// A container with at least one video stream.
    Video(VideoSource),
    /// An animated GIF.
    Animation(AnimatedImageSource),
}

impl FrameSource {
    /// Open `path`, choosing the decoder from the file extension: `.gif`
    /// (any case) opens an [`AnimatedImageSource`], anything else goes
    /// through FFmpeg.
    ///
    /// # Errors
    ///
    /// Source errors from the chosen decoder.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FlipbookError> {
        let path = path.as_ref();
        if is_animated_image(path) {
            AnimatedImageSource::open(path).map(FrameSource::Animation)
        } else {
            VideoSource::open(path).map(FrameSource::Video)
        }
    }

    pub fn info(&self) -> &SourceInfo {
        match self {
            FrameSource::Video(source) => source.info(),
            FrameSource::Animation(source) => source.info(),
        }
    }

    /// Whether frames come from FFmpeg and can be resampled.
    pub fn is_video(&self) -> bool {
        matches!(self, FrameSource::Video(_))
    }

    /// Start decoding.
    ///
    /// # Errors
    ///
    /// Decoder setup errors.
    pub fn into_frames(self) -> Result<Frames, FlipbookError> {
        match self {
            FrameSource::Video(source) => source.into_frames().map(Frames::Video),
            FrameSource::Animation(source) => source.into_frames().map(Frames::Animation),
        }
    }
}

/// Lazy frame iterator over either kind of source.
pub enum Frames {
    Video(VideoFrames),
    Animation(AnimationFrames),
}

impl Iterator for Frames {
    type Item = Result<DynamicImage, FlipbookError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Frames::Video(frames) => frames.next(),
            Frames::Animation(frames) => frames.next(),
        }
    }
}

fn is_animated_image(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("gif"))
}

