//! # flipbook
//!
//! Turn a video or an animated GIF into a printable flip-book: a landscape
//! PDF whose pages carry a grid of consecutive frames, ruled for cutting,
//! with an optional binding strip that holds the sequence number of every
//! frame.
//!
//! Video containers are decoded with FFmpeg via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next); GIFs are decoded
//! with the [`gif`](https://crates.io/crates/gif) crate and composited onto
//! a full-size canvas. The PDF is written with
//! [`pdf-writer`](https://crates.io/crates/pdf-writer).
//!
//! ## Quick Start
//!
//! ```no_run
//! use flipbook::{Flipbook, FlipbookOptions};
//!
//! let summary = Flipbook::open("input.mp4")?
//!     .create("flip-book.pdf", &FlipbookOptions::new())?;
//! println!("{} frames on {} pages", summary.frames, summary.pages);
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```
//!
//! ### Planning a Layout
//!
//! The grid depends only on the paper, margins, frame height, resolution and
//! binding offset, plus the aspect ratio of the source:
//!
//! ```
//! use flipbook::{compute_layout, Margin, PaperSize};
//!
//! let layout = compute_layout(PaperSize::A4, Margin::default(), 30.0, 4.0 / 3.0, 200, 15.0)?;
//! assert_eq!(layout.frames_per_page(), 5 * 6);
//! assert_eq!(layout.page_count(95), 4);
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```
//!
//! ## Features
//!
//! - **Grid layout** on A5, A4, A3, Letter and Legal paper, always landscape
//! - **Frame-rate resampling** of videos to the requested rate before layout
//! - **Animated GIFs** with sparse sub-frames composited onto a full canvas
//! - **Binding offset** with rotated sequence labels and secondary cut lines
//! - **Progress callbacks** for both resampling and pagination
//! - **Scoped temporary files**, removed when a run ends
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
pub mod document;
pub mod error;
pub mod ffmpeg;
pub mod flipbook;
pub mod geometry;
pub mod layout;
pub mod paginate;
pub mod paper;
pub mod progress;
pub mod render;
pub mod resample;
pub mod source;

pub use configuration::FlipbookOptions;
pub use document::{DocumentMetadata, DocumentWriter, PdfDocument};
pub use error::{ErrorKind, FlipbookError};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use flipbook::{Flipbook, FlipbookSummary};
pub use geometry::{Line, Margin, PixelSize, Size};
pub use layout::{PageLayout, Placement, compute_layout, millimetres_to_pixels};
pub use paginate::{PaginationState, PaginationSummary, paginate};
pub use paper::PaperSize;
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use render::{FrameRenderer, fit_within};
pub use resample::{Resampler, needs_resampling, resampled_frame_count};
pub use source::{
    AnimatedImageSource, FrameDelta, FrameSource, Frames, SourceInfo, VideoSource,
    composite_canvas,
};
