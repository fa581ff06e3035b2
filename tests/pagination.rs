//! Pagination driver tests.
//!
//! Frames are synthetic images fed straight into [`paginate`]; the document
//! side is a recording [`DocumentWriter`], so no fixtures are required.

use std::path::{Path, PathBuf};

use flipbook::{
    DocumentWriter, ErrorKind, FlipbookError, FlipbookOptions, FrameRenderer, Margin, PageLayout,
    PaginationState, PaperSize, compute_layout, paginate,
};
use image::{DynamicImage, Rgb, RgbImage};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    NewPage,
    Image {
        path: PathBuf,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Line,
    Text {
        text: String,
        x: f64,
        y: f64,
        angle: f64,
    },
}

/// Records every drawing command. Checks that frame images exist on disk
/// at the moment they are placed.
#[derive(Default)]
struct RecordingWriter {
    commands: Vec<Command>,
    image_sizes: Vec<(u32, u32)>,
}

impl RecordingWriter {
    fn count(&self, predicate: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|command| predicate(command)).count()
    }

    fn pages(&self) -> usize {
        self.count(|command| matches!(command, Command::NewPage))
    }

    fn labels(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                Command::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DocumentWriter for RecordingWriter {
    fn new_page(&mut self) -> Result<(), FlipbookError> {
        self.commands.push(Command::NewPage);
        Ok(())
    }

    fn place_image(
        &mut self,
        path: &Path,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), FlipbookError> {
        assert!(path.exists(), "frame image missing: {}", path.display());
        self.image_sizes
            .push(image::image_dimensions(path).expect("frame image should be readable"));
        self.commands.push(Command::Image {
            path: path.to_path_buf(),
            x,
            y,
            width,
            height,
        });
        Ok(())
    }

    fn draw_line(&mut self, _x0: f64, _y0: f64, _x1: f64, _y1: f64) -> Result<(), FlipbookError> {
        self.commands.push(Command::Line);
        Ok(())
    }

    fn draw_rotated_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        angle: f64,
    ) -> Result<(), FlipbookError> {
        self.commands.push(Command::Text {
            text: text.to_string(),
            x,
            y,
            angle,
        });
        Ok(())
    }

    fn finalize(&mut self, _path: &Path) -> Result<(), FlipbookError> {
        Ok(())
    }
}

/// A5, 40 mm square frames: 4 x 3 tiles per page.
fn layout(binding_offset: f64) -> PageLayout {
    compute_layout(
        PaperSize::A5,
        Margin::default(),
        40.0,
        1.0,
        200,
        binding_offset,
    )
    .unwrap()
}

fn frames(count: usize, size: u32) -> impl Iterator<Item = Result<DynamicImage, FlipbookError>> {
    (0..count).map(move |index| {
        let shade = (index % 256) as u8;
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            size,
            size,
            Rgb([shade, 0, 255 - shade]),
        )))
    })
}

fn run(
    layout: &PageLayout,
    count: usize,
    frame_size: u32,
) -> (Result<flipbook::PaginationSummary, FlipbookError>, RecordingWriter) {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let renderer = FrameRenderer::new(directory.path(), layout.frame_pixels, 90);
    let mut writer = RecordingWriter::default();
    let result = paginate(
        layout,
        frames(count, frame_size),
        count as u64,
        &renderer,
        &mut writer,
        &FlipbookOptions::new(),
    );
    (result, writer)
}

// ── PaginationState ────────────────────────────────────────────────

#[test]
fn first_advance_lands_on_first_tile() {
    let layout = layout(5.0);
    let advance = PaginationState::new().advance(&layout);

    assert!(!advance.page_break);
    assert_eq!(advance.state.page, 0);
    assert_eq!(advance.state.column, 0);
    assert_eq!(advance.state.row, 0);
    assert_eq!(advance.state.index, 0);
}

#[test]
fn page_breaks_after_a_full_grid() {
    let layout = layout(5.0);
    let mut state = PaginationState::new();
    let mut breaks = Vec::new();

    for _ in 0..30 {
        let advance = state.advance(&layout);
        if advance.page_break {
            breaks.push(advance.state.index);
        }
        state = advance.state.placed();
    }

    assert_eq!(breaks, vec![12, 24]);
    assert_eq!(state.index, 30);
    assert_eq!(state.page, 2);
    assert_eq!(state.occupied_rows(), 2);
}

#[test]
fn state_placement_matches_layout_placement() {
    let layout = layout(5.0);
    let mut state = PaginationState::new();
    for index in 0..40 {
        let advance = state.advance(&layout);
        assert_eq!(advance.state.placement(&layout), layout.placement(index));
        state = advance.state.placed();
    }
}

// ── paginate ───────────────────────────────────────────────────────

#[test]
fn ninety_five_frames_on_a_four_by_three_grid() {
    let layout = layout(5.0);
    let (result, writer) = run(&layout, 95, 32);
    let summary = result.expect("pagination should succeed");

    assert_eq!(summary.frames, 95);
    assert_eq!(summary.pages, 8);
    assert_eq!(summary.frames_on_last_page, 11);
    assert_eq!(writer.pages(), 8);
    assert_eq!(
        writer.count(|command| matches!(command, Command::Image { .. })),
        95
    );

    // Seven full-grid rulings at page breaks plus the final one.
    let lines_per_ruling = layout.ruling(3).len();
    assert_eq!(
        writer.count(|command| matches!(command, Command::Line)),
        8 * lines_per_ruling
    );

    // The final ruling comes after the last placed frame.
    let tail = &writer.commands[writer.commands.len() - lines_per_ruling..];
    assert!(tail.iter().all(|command| matches!(command, Command::Line)));
    assert!(matches!(
        writer.commands[writer.commands.len() - lines_per_ruling - 1],
        Command::Text { .. }
    ));
}

#[test]
fn first_command_is_a_new_page() {
    let (result, writer) = run(&layout(5.0), 3, 16);
    result.unwrap();
    assert_eq!(writer.commands.first(), Some(&Command::NewPage));
    assert_eq!(writer.pages(), 1);
}

#[test]
fn exactly_full_page_is_ruled_once() {
    let layout = layout(5.0);
    let (result, writer) = run(&layout, 12, 16);
    let summary = result.unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(summary.frames_on_last_page, 12);
    assert_eq!(
        writer.count(|command| matches!(command, Command::Line)),
        layout.ruling(3).len()
    );
}

#[test]
fn partial_last_row_gets_a_partial_ruling() {
    let layout = layout(5.0);
    let (result, writer) = run(&layout, 5, 16);
    result.unwrap();

    // Frames 0..=4 use rows 0 and 1.
    assert_eq!(
        writer.count(|command| matches!(command, Command::Line)),
        layout.ruling(2).len()
    );
}

#[test]
fn labels_are_the_sequence_in_order() {
    let (result, writer) = run(&layout(5.0), 95, 16);
    result.unwrap();

    let expected: Vec<String> = (0..95).map(|index: u32| index.to_string()).collect();
    assert_eq!(writer.labels(), expected);
    for command in &writer.commands {
        if let Command::Text { angle, .. } = command {
            assert_eq!(*angle, 90.0);
        }
    }
}

#[test]
fn zero_offset_disables_labels() {
    let layout = layout(0.0);
    let (result, writer) = run(&layout, 30, 16);
    result.unwrap();

    assert!(writer.labels().is_empty());
    assert_eq!(layout.ruling(3).len(), 5 + 4);
}

#[test]
fn images_and_labels_are_positioned_in_their_tiles() {
    let layout = layout(5.0);
    let (result, writer) = run(&layout, 6, 16);
    result.unwrap();

    let images: Vec<_> = writer
        .commands
        .iter()
        .filter_map(|command| match command {
            Command::Image {
                x,
                y,
                width,
                height,
                ..
            } => Some((*x, *y, *width, *height)),
            _ => None,
        })
        .collect();
    assert_eq!(images[0], (15.0, 10.0, 40.0, 40.0));
    assert_eq!(images[1], (60.0, 10.0, 40.0, 40.0));
    assert_eq!(images[5], (60.0, 50.0, 40.0, 40.0));

    let positions: Vec<_> = writer
        .commands
        .iter()
        .filter_map(|command| match command {
            Command::Text { x, y, .. } => Some((*x, *y)),
            _ => None,
        })
        .collect();
    assert_eq!(positions[0], (15.0, 48.0));
    assert_eq!(positions[5], (60.0, 88.0));
}

#[test]
fn frame_images_are_distinct_files() {
    let (result, writer) = run(&layout(5.0), 20, 16);
    result.unwrap();

    let mut paths: Vec<_> = writer
        .commands
        .iter()
        .filter_map(|command| match command {
            Command::Image { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 20);
}

#[test]
fn large_frames_are_downscaled_to_the_pixel_box() {
    let layout = layout(5.0);
    assert_eq!(layout.frame_pixels.width, 315);

    let (result, writer) = run(&layout, 2, 640);
    result.unwrap();
    assert!(writer.image_sizes.iter().all(|&size| size == (315, 315)));
}

#[test]
fn small_frames_are_not_upscaled() {
    let (result, writer) = run(&layout(5.0), 2, 64);
    result.unwrap();
    assert!(writer.image_sizes.iter().all(|&size| size == (64, 64)));
}

#[test]
fn empty_source_is_an_error() {
    let (result, writer) = run(&layout(5.0), 0, 16);
    let error = result.unwrap_err();

    assert!(matches!(error, FlipbookError::EmptySource));
    assert_eq!(error.kind(), ErrorKind::Source);
    assert_eq!(writer.count(|command| matches!(command, Command::Line)), 0);
}

#[test]
fn source_errors_abort_pagination() {
    let layout = layout(5.0);
    let directory = tempfile::tempdir().unwrap();
    let renderer = FrameRenderer::new(directory.path(), layout.frame_pixels, 90);
    let mut writer = RecordingWriter::default();

    let failing = frames(2, 16).chain(std::iter::once(Err(FlipbookError::VideoDecodeError(
        "corrupt packet".to_string(),
    ))));
    let error = paginate(
        &layout,
        failing.chain(frames(5, 16)),
        7,
        &renderer,
        &mut writer,
        &FlipbookOptions::new(),
    )
    .unwrap_err();

    assert!(matches!(error, FlipbookError::VideoDecodeError(_)));
    assert_eq!(
        writer.count(|command| matches!(command, Command::Image { .. })),
        2
    );
}

#[test]
fn render_errors_abort_pagination() {
    let layout = layout(5.0);
    let directory = tempfile::tempdir().unwrap();
    let missing = directory.path().join("does-not-exist");
    let renderer = FrameRenderer::new(&missing, layout.frame_pixels, 90);
    let mut writer = RecordingWriter::default();

    let error = paginate(
        &layout,
        frames(3, 16),
        3,
        &renderer,
        &mut writer,
        &FlipbookOptions::new(),
    )
    .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Render);
    assert!(matches!(error, FlipbookError::RenderError { sequence: 0, .. }));
}
