//! The pagination driver.
//!
//! Frames are pulled one at a time from a lazy sequence and pushed through a
//! small state machine ([`PaginationState`]) that tracks the current page,
//! column, row and sequence index. For every frame the driver renders a still
//! image, places it in its tile, and labels it when a binding offset is set.
//! Page breaks happen lazily: a full page is ruled and a new one started only
//! when the next frame arrives, so the last page always gets its ruling from
//! the terminal step.
//!
//! Retrieval, rendering and placement run in lockstep on the calling thread.

use image::DynamicImage;

use crate::configuration::FlipbookOptions;
use crate::document::DocumentWriter;
use crate::error::FlipbookError;
use crate::layout::{PageLayout, Placement};
use crate::progress::{OperationType, ProgressTracker};
use crate::render::FrameRenderer;

/// Label rotation: text runs bottom-to-top along the binding strip.
pub const LABEL_ANGLE_DEGREES: f64 = 90.0;

/// Position of the driver in the page grid.
///
/// The initial state sits one column before the first tile so that the
/// first [`advance`](PaginationState::advance) lands on column 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// Zero-based page index.
    pub page: u64,
    /// Column of the most recently placed frame; `-1` before the first.
    pub column: i64,
    /// Row of the most recently placed frame.
    pub row: i64,
    /// Number of frames placed so far, which is also the sequence index of
    /// the next frame.
    pub index: u64,
}

/// Result of one [`PaginationState::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// Where the incoming frame goes.
    pub state: PaginationState,
    /// The previous page was full and a new one must be started before
    /// placing the frame.
    pub page_break: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    pub const fn new() -> Self {
        Self {
            page: 0,
            column: -1,
            row: 0,
            index: 0,
        }
    }

    /// Move to the tile for the next frame.
    ///
    /// The returned state's `index` is still the sequence index of the frame
    /// being placed; call [`placed`](PaginationState::placed) once it is on
    /// the page.
    pub fn advance(self, layout: &PageLayout) -> Advance {
        let mut next = self;
        let mut page_break = false;

        next.column += 1;
        if next.column == layout.columns as i64 {
            next.column = 0;
            next.row += 1;
            if next.row == layout.rows as i64 {
                next.row = 0;
                next.page += 1;
                page_break = true;
            }
        }

        Advance {
            state: next,
            page_break,
        }
    }

    /// The state after the current frame has been placed.
    pub fn placed(self) -> Self {
        Self {
            index: self.index + 1,
            ..self
        }
    }

    /// The tile of the frame this state points at.
    pub fn placement(&self, layout: &PageLayout) -> Placement {
        let (x, y) = layout.tile_origin(self.column, self.row);
        Placement {
            index: self.index,
            page: self.page,
            column: self.column.max(0) as u32,
            row: self.row as u32,
            x,
            y,
        }
    }

    /// Rows occupied on the current page, for ruling.
    pub fn occupied_rows(&self) -> u32 {
        if self.index == 0 {
            0
        } else {
            (self.row + 1) as u32
        }
    }
}

/// What a finished pagination produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSummary {
    /// Frames placed.
    pub frames: u64,
    /// Pages started.
    pub pages: u64,
    /// Frames on the last page.
    pub frames_on_last_page: u64,
}

/// Stream `frames` onto pages.
///
/// `expected_frames` is only used for progress reporting. The first page is
/// requested before the first frame is pulled. The document is not
/// finalized; that is the caller's job.
///
/// # Errors
///
/// - The first error yielded by `frames`.
/// - [`FlipbookError::EmptySource`] if `frames` yields nothing.
/// - Render errors from `renderer` and write errors from `writer`.
pub fn paginate<I, W>(
    layout: &PageLayout,
    frames: I,
    expected_frames: u64,
    renderer: &FrameRenderer,
    writer: &mut W,
    options: &FlipbookOptions,
) -> Result<PaginationSummary, FlipbookError>
where
    I: IntoIterator<Item = Result<DynamicImage, FlipbookError>>,
    W: DocumentWriter + ?Sized,
{
    log::debug!(
        "Paginating ~{} frame(s) into {}x{} tiles per page",
        expected_frames,
        layout.columns,
        layout.rows,
    );
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::Pagination,
        Some(expected_frames),
        options.batch_size,
    );

    writer.new_page()?;
    let mut state = PaginationState::new();

    for frame in frames {
        let frame = frame?;

        let advance = state.advance(layout);
        if advance.page_break {
            draw_ruling(layout, layout.rows, writer)?;
            writer.new_page()?;
            log::debug!("Started page {}", advance.state.page + 1);
        }
        state = advance.state;

        place_frame(layout, &state, &frame, renderer, writer)?;
        tracker.advance(Some(state.index), Some(state.page));
        state = state.placed();
    }

    if state.index == 0 {
        return Err(FlipbookError::EmptySource);
    }
    draw_ruling(layout, state.occupied_rows(), writer)?;
    tracker.finish();

    let per_page = layout.frames_per_page();
    let summary = PaginationSummary {
        frames: state.index,
        pages: state.page + 1,
        frames_on_last_page: state.index - state.page * per_page,
    };
    log::debug!(
        "Placed {} frame(s) on {} page(s)",
        summary.frames,
        summary.pages
    );
    Ok(summary)
}

fn place_frame<W>(
    layout: &PageLayout,
    state: &PaginationState,
    frame: &DynamicImage,
    renderer: &FrameRenderer,
    writer: &mut W,
) -> Result<(), FlipbookError>
where
    W: DocumentWriter + ?Sized,
{
    let path = renderer.render(frame, state.index)?;
    let placement = state.placement(layout);

    let (x, y) = layout.image_origin(&placement);
    writer.place_image(
        &path,
        x,
        y,
        layout.frame_size.width,
        layout.frame_size.height,
    )?;

    if layout.has_binding() {
        let (x, y) = layout.label_anchor(&placement);
        writer.draw_rotated_text(&state.index.to_string(), x, y, LABEL_ANGLE_DEGREES)?;
    }
    Ok(())
}

/// Emit the cut lines for a page with `rows` occupied rows.
pub fn draw_ruling<W>(layout: &PageLayout, rows: u32, writer: &mut W) -> Result<(), FlipbookError>
where
    W: DocumentWriter + ?Sized,
{
    for line in layout.ruling(rows) {
        writer.draw_line(line.x0, line.y0, line.x1, line.y1)?;
    }
    Ok(())
}
