//! Grid layout of frames on printed pages.
//!
//! [`compute_layout`] turns a paper size, margins, a target frame height, the
//! source aspect ratio, an output resolution and an optional binding offset
//! into an immutable [`PageLayout`]. The layout then answers every geometric
//! question the pagination driver asks: where frame `n` goes, how many pages
//! `n` frames need, and which lines rule a page.
//!
//! Frame height is the independent variable; width follows from the source
//! aspect ratio. The binding offset widens every tile horizontally and never
//! changes vertical spacing.
//!
//! # Example
//!
//! ```
//! use flipbook::{compute_layout, Margin, PaperSize};
//!
//! let layout = compute_layout(PaperSize::A4, Margin::default(), 30.0, 16.0 / 9.0, 200, 15.0)?;
//! assert_eq!((layout.columns, layout.rows), (4, 6));
//!
//! let placement = layout.placement(25);
//! assert_eq!((placement.page, placement.column, placement.row), (1, 1, 0));
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```

use crate::error::FlipbookError;
use crate::geometry::{Line, Margin, PixelSize, Size};
use crate::paper::PaperSize;

/// Millimetres per inch, for DPI conversions.
pub const MM_PER_INCH: f64 = 25.4;

/// Horizontal distance of a sequence label from the tile's left edge.
pub const LABEL_INSET_MM: f64 = 5.0;

/// Vertical distance of a sequence label's baseline above the tile's bottom edge.
pub const LABEL_LIFT_MM: f64 = 2.0;

/// Per-run page geometry.
///
/// Computed once by [`compute_layout`] before any frame is processed and
/// never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct PageLayout {
    /// The paper the layout was computed for.
    pub paper: PaperSize,
    /// Page margins.
    pub margins: Margin,
    /// Paper minus margins.
    pub printable_area: Size,
    /// Physical size of one frame.
    pub frame_size: Size,
    /// Pixel size each frame is downscaled to.
    pub frame_pixels: PixelSize,
    /// Tile pitch: frame width plus binding offset, and frame height.
    pub pitch: Size,
    /// Extra horizontal space reserved per tile for binding. `0.0` disables
    /// labels and secondary rulings.
    pub binding_offset: f64,
    /// Output resolution in dots per inch.
    pub dpi: u32,
    /// Tiles per row.
    pub columns: u32,
    /// Tiles per column.
    pub rows: u32,
}

/// Where a single frame lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Zero-based sequence index of the frame.
    pub index: u64,
    /// Zero-based page index.
    pub page: u64,
    /// Column within the page.
    pub column: u32,
    /// Row within the page.
    pub row: u32,
    /// Left edge of the tile in millimetres.
    pub x: f64,
    /// Top edge of the tile in millimetres.
    pub y: f64,
}

/// Compute the page layout for one run.
///
/// Pure and deterministic: identical inputs always produce an identical
/// layout.
///
/// # Errors
///
/// All errors are of kind [`ErrorKind::Configuration`](crate::ErrorKind):
///
/// - [`FlipbookError::InvalidParameter`] for a non-positive frame height or
///   aspect ratio, a zero DPI, or a negative binding offset.
/// - [`FlipbookError::NonPositivePrintableArea`] if the margins consume the
///   page.
/// - [`FlipbookError::FrameTooLarge`] if not even one tile fits per row or
///   column.
pub fn compute_layout(
    paper: PaperSize,
    margins: Margin,
    frame_height_mm: f64,
    source_aspect: f64,
    dpi: u32,
    binding_offset: f64,
) -> Result<PageLayout, FlipbookError> {
    if !frame_height_mm.is_finite() || frame_height_mm <= 0.0 {
        return Err(FlipbookError::invalid(
            "frame height",
            format!("{frame_height_mm}mm must be positive"),
        ));
    }
    if !source_aspect.is_finite() || source_aspect <= 0.0 {
        return Err(FlipbookError::invalid(
            "aspect ratio",
            format!("{source_aspect} must be positive"),
        ));
    }
    if dpi == 0 {
        return Err(FlipbookError::invalid("dpi", "must be greater than zero"));
    }
    if !binding_offset.is_finite() || binding_offset < 0.0 {
        return Err(FlipbookError::invalid(
            "binding offset",
            format!("{binding_offset}mm must not be negative"),
        ));
    }

    let paper_size = paper.dimensions();
    let printable_area = Size::new(
        paper_size.width - margins.left - margins.right,
        paper_size.height - margins.top - margins.bottom,
    );
    if !(printable_area.width > 0.0 && printable_area.height > 0.0) {
        return Err(FlipbookError::NonPositivePrintableArea {
            width: printable_area.width,
            height: printable_area.height,
        });
    }

    let frame_size = Size::new(frame_height_mm * source_aspect, frame_height_mm);
    let frame_pixels = PixelSize::new(
        millimetres_to_pixels(frame_size.width, dpi),
        millimetres_to_pixels(frame_size.height, dpi),
    );
    let pitch = Size::new(binding_offset + frame_size.width, frame_size.height);

    let columns = (printable_area.width / pitch.width).floor();
    let rows = (printable_area.height / pitch.height).floor();
    if columns < 1.0 || rows < 1.0 {
        return Err(FlipbookError::FrameTooLarge {
            tile_width: pitch.width,
            tile_height: pitch.height,
            printable_width: printable_area.width,
            printable_height: printable_area.height,
            columns: columns.max(0.0) as u32,
            rows: rows.max(0.0) as u32,
        });
    }
    if columns > u32::MAX as f64 || rows > u32::MAX as f64 {
        return Err(FlipbookError::invalid(
            "frame height",
            format!("{frame_height_mm}mm gives a {columns} x {rows} tile grid"),
        ));
    }

    let layout = PageLayout {
        paper,
        margins,
        printable_area,
        frame_size,
        frame_pixels,
        pitch,
        binding_offset,
        dpi,
        columns: columns as u32,
        rows: rows as u32,
    };
    log::debug!(
        "Layout on {}: {}x{} tiles, frame {:.2}x{:.2}mm ({}x{}px @ {}dpi), pitch {:.2}x{:.2}mm",
        paper,
        layout.columns,
        layout.rows,
        frame_size.width,
        frame_size.height,
        frame_pixels.width,
        frame_pixels.height,
        dpi,
        pitch.width,
        pitch.height,
    );
    Ok(layout)
}

/// Convert a physical length to a pixel count at `dpi`, never below 1.
pub fn millimetres_to_pixels(length_mm: f64, dpi: u32) -> u32 {
    (length_mm / MM_PER_INCH * dpi as f64).round().max(1.0) as u32
}

impl PageLayout {
    /// Number of tiles on a full page.
    pub fn frames_per_page(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }

    /// Number of pages needed for `frame_count` frames.
    pub fn page_count(&self, frame_count: u64) -> u64 {
        frame_count.div_ceil(self.frames_per_page())
    }

    /// Placement of the frame with sequence index `index`.
    pub fn placement(&self, index: u64) -> Placement {
        let per_page = self.frames_per_page();
        let slot = index % per_page;
        let column = (slot % self.columns as u64) as u32;
        let row = (slot / self.columns as u64) as u32;
        let (x, y) = self.tile_origin(column as i64, row as i64);
        Placement {
            index,
            page: index / per_page,
            column,
            row,
            x,
            y,
        }
    }

    /// Top-left corner of the tile at `(column, row)`.
    pub fn tile_origin(&self, column: i64, row: i64) -> (f64, f64) {
        (
            self.margins.left + column as f64 * self.pitch.width,
            self.margins.top + row as f64 * self.pitch.height,
        )
    }

    /// Where the frame image of a tile is drawn: right of the binding strip.
    pub fn image_origin(&self, placement: &Placement) -> (f64, f64) {
        (placement.x + self.binding_offset, placement.y)
    }

    /// Baseline anchor of the rotated sequence label inside the binding strip.
    pub fn label_anchor(&self, placement: &Placement) -> (f64, f64) {
        (
            placement.x + LABEL_INSET_MM,
            placement.y + self.frame_size.height - LABEL_LIFT_MM,
        )
    }

    /// Whether tiles carry a binding strip with sequence labels.
    pub fn has_binding(&self) -> bool {
        self.binding_offset > 0.0
    }

    /// Size of the ruled grid on a full page.
    pub fn grid_extent(&self) -> Size {
        Size::new(
            self.columns as f64 * self.pitch.width,
            self.rows as f64 * self.pitch.height,
        )
    }

    /// Cut lines for a page whose first `rows` rows are occupied.
    ///
    /// Vertical lines sit at every column boundary; with a binding offset a
    /// secondary line marks the inner edge of each binding strip. Horizontal
    /// lines sit at every boundary of the occupied rows. `rows` is clamped
    /// to the grid height.
    pub fn ruling(&self, rows: u32) -> Vec<Line> {
        let rows = rows.min(self.rows);
        let (x0, y0) = self.tile_origin(0, 0);
        let (x1, y1) = self.tile_origin(self.columns as i64, rows as i64);

        let mut lines = Vec::with_capacity((self.columns as usize + 1) * 2 + rows as usize + 1);
        for column in 0..=self.columns {
            let (x, _) = self.tile_origin(column as i64, 0);
            lines.push(Line::new(x, y0, x, y1));
            if self.has_binding() && column != self.columns {
                lines.push(Line::new(
                    x + self.binding_offset,
                    y0,
                    x + self.binding_offset,
                    y1,
                ));
            }
        }
        for row in 0..=rows {
            let (_, y) = self.tile_origin(0, row as i64);
            lines.push(Line::new(x0, y, x1, y));
        }
        lines
    }
}
