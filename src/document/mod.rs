//! Output documents.
//!
//! The pagination driver talks to its output exclusively through the
//! [`DocumentWriter`] trait, using millimetres with a top-left origin.
//! [`PdfDocument`] is the implementation used for real runs.

mod pdf;

use std::path::Path;

use crate::error::FlipbookError;

pub use pdf::PdfDocument;

/// Sink for the drawing commands of a flip-book.
///
/// The writer starts without pages; the driver requests the first page
/// before placing anything.
pub trait DocumentWriter {
    /// Start a new page. Subsequent drawing commands target it.
    fn new_page(&mut self) -> Result<(), FlipbookError>;

    /// Draw the still image stored at `path` into the rectangle at
    /// `(x, y)` with size `width` x `height`.
    fn place_image(
        &mut self,
        path: &Path,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), FlipbookError>;

    /// Stroke a line from `(x0, y0)` to `(x1, y1)`.
    fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<(), FlipbookError>;

    /// Draw `text` with its baseline starting at `(x, y)`, rotated
    /// counter-clockwise by `angle` degrees. Rotation does not carry over to
    /// later commands.
    fn draw_rotated_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        angle: f64,
    ) -> Result<(), FlipbookError>;

    /// Assemble the document and write it to `path`.
    fn finalize(&mut self, path: &Path) -> Result<(), FlipbookError>;
}

/// Descriptive fields stored in the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Document title.
    pub title: String,
    /// Document author, if any.
    pub author: Option<String>,
    /// Producing application.
    pub creator: String,
    /// Comma-separated keywords.
    pub keywords: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: "Flip-book".to_string(),
            author: None,
            creator: env!("CARGO_PKG_NAME").to_string(),
            keywords: "flip-book, video, animated GIF".to_string(),
        }
    }
}
