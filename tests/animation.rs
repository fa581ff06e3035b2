//! Animated GIF source tests.
//!
//! GIFs are generated on the fly into a temporary directory.

use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use flipbook::{
    AnimatedImageSource, ErrorKind, Flipbook, FlipbookError, FlipbookOptions, FrameDelta,
    FrameSource, ProgressCallback, ProgressInfo, composite_canvas,
};
use image::{Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Palette indices: 0 black, 1 red, 2 blue.
const PALETTE: [u8; 9] = [0, 0, 0, 255, 0, 0, 0, 0, 255];

/// Write a 10x10 GIF whose frame `k` paints only column `k` red.
fn write_column_sweep(path: &Path) {
    let mut file = File::create(path).expect("Failed to create GIF");
    let mut encoder = gif::Encoder::new(&mut file, 10, 10, &PALETTE).expect("Failed to start GIF");
    for column in 0..10u16 {
        let frame = gif::Frame {
            left: column,
            top: 0,
            width: 1,
            height: 10,
            delay: 5,
            buffer: Cow::Owned(vec![1; 10]),
            ..gif::Frame::default()
        };
        encoder.write_frame(&frame).expect("Failed to write GIF frame");
    }
}

fn sweep_fixture(name: &str) -> (tempfile::TempDir, PathBuf) {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = directory.path().join(name);
    write_column_sweep(&path);
    (directory, path)
}

// ── composite_canvas ───────────────────────────────────────────────

#[test]
fn composite_overwrites_opaque_pixels() {
    let canvas = RgbaImage::from_pixel(4, 4, WHITE);
    let delta = FrameDelta {
        left: 1,
        top: 2,
        image: RgbaImage::from_pixel(2, 1, RED),
    };

    let next = composite_canvas(&canvas, &delta);
    assert_eq!(next.get_pixel(1, 2), &RED);
    assert_eq!(next.get_pixel(2, 2), &RED);
    assert_eq!(next.get_pixel(0, 2), &WHITE);
    assert_eq!(next.get_pixel(1, 1), &WHITE);
}

#[test]
fn composite_keeps_canvas_under_transparent_pixels() {
    let canvas = RgbaImage::from_pixel(3, 3, RED);
    let mut image = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));
    image.put_pixel(1, 1, BLUE);
    let delta = FrameDelta {
        left: 0,
        top: 0,
        image,
    };

    let next = composite_canvas(&canvas, &delta);
    assert_eq!(next.get_pixel(1, 1), &BLUE);
    for (x, y, pixel) in next.enumerate_pixels() {
        if (x, y) != (1, 1) {
            assert_eq!(pixel, &RED);
        }
    }
}

#[test]
fn composite_clips_deltas_outside_the_canvas() {
    let canvas = RgbaImage::from_pixel(2, 2, WHITE);
    let delta = FrameDelta {
        left: 1,
        top: 1,
        image: RgbaImage::from_pixel(3, 3, RED),
    };

    let next = composite_canvas(&canvas, &delta);
    assert_eq!(next.dimensions(), (2, 2));
    assert_eq!(next.get_pixel(1, 1), &RED);
    assert_eq!(next.get_pixel(0, 0), &WHITE);
}

#[test]
fn composite_leaves_previous_canvas_untouched() {
    let canvas = RgbaImage::from_pixel(2, 2, WHITE);
    let delta = FrameDelta {
        left: 0,
        top: 0,
        image: RgbaImage::from_pixel(1, 1, RED),
    };

    let _ = composite_canvas(&canvas, &delta);
    assert!(canvas.pixels().all(|pixel| pixel == &WHITE));
}

// ── AnimatedImageSource ────────────────────────────────────────────

#[test]
fn open_reports_frames_and_duration() {
    let (_directory, path) = sweep_fixture("sweep.gif");
    let source = AnimatedImageSource::open(&path).expect("Failed to open GIF");
    let info = source.info();

    assert_eq!(info.frame_count, 10);
    assert_eq!((info.width, info.height), (10, 10));
    assert_eq!(info.frames_per_second, 0.0);
    assert_eq!(info.duration, Duration::from_millis(500));
    assert_eq!(info.aspect_ratio(), 1.0);
}

#[test]
fn ten_sparse_frames_become_ten_full_canvases() {
    let (_directory, path) = sweep_fixture("sweep.gif");
    let frames: Vec<_> = AnimatedImageSource::open(&path)
        .unwrap()
        .into_frames()
        .unwrap()
        .collect::<Result<_, _>>()
        .expect("GIF frames should decode");

    assert_eq!(frames.len(), 10);
    for (k, frame) in frames.iter().enumerate() {
        let canvas = frame.to_rgba8();
        assert_eq!(canvas.dimensions(), (10, 10));
        for x in 0..10u32 {
            let expected = if x as usize <= k { &RED } else { &WHITE };
            assert_eq!(canvas.get_pixel(x, 5), expected, "frame {k}, column {x}");
        }
    }
}

#[test]
fn gif_extension_is_case_insensitive() {
    let (_directory, path) = sweep_fixture("SWEEP.GIF");
    let source = FrameSource::open(&path).expect("Failed to open GIF");

    assert!(!source.is_video());
    assert_eq!(source.info().frame_count, 10);
}

#[test]
fn missing_gif_is_a_file_open_error() {
    let error = AnimatedImageSource::open("this_file_does_not_exist.gif").unwrap_err();
    assert!(matches!(error, FlipbookError::FileOpen { .. }));
    assert_eq!(error.kind(), ErrorKind::Source);
}

#[test]
fn garbage_gif_is_a_decode_error() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("broken.gif");
    std::fs::write(&path, b"this is not a GIF").unwrap();

    let error = AnimatedImageSource::open(&path).unwrap_err();
    assert!(matches!(error, FlipbookError::AnimationDecodeError(_)));
    assert_eq!(error.kind(), ErrorKind::Source);
}

// ── End to end ─────────────────────────────────────────────────────

#[test]
fn gif_to_pdf() {
    let (directory, path) = sweep_fixture("sweep.gif");
    let output = directory.path().join("book.pdf");
    let scratch = directory.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();

    let options = FlipbookOptions::new().with_working_directory(&scratch);
    let summary = Flipbook::open(&path)
        .unwrap()
        .create(&output, &options)
        .expect("GIF conversion should succeed");

    assert_eq!(summary.frames, 10);
    assert_eq!(summary.pages, 1);
    assert!(!summary.resampled);

    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(
        std::fs::read_dir(&scratch).unwrap().count(),
        0,
        "working directory should be removed"
    );
}

#[test]
fn oversized_frame_fails_before_writing_anything() {
    let (directory, path) = sweep_fixture("sweep.gif");
    let output = directory.path().join("book.pdf");
    let scratch = directory.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();

    let options = FlipbookOptions::new()
        .with_frame_height(500.0)
        .with_working_directory(&scratch);
    let error = Flipbook::open(&path)
        .unwrap()
        .create(&output, &options)
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
}

#[test]
fn source_failure_mid_run_leaves_nothing_behind() {
    let (directory, path) = sweep_fixture("sweep.gif");
    let output = directory.path().join("book.pdf");
    let scratch = directory.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();

    // Frames are streamed from a second read of the file, after the
    // working directory exists.
    let flipbook = Flipbook::open(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let options = FlipbookOptions::new().with_working_directory(&scratch);
    let error = flipbook.create(&output, &options).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Source);
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
}

/// Empties `directory` when the final pagination report arrives, after
/// every frame has been embedded but before the PDF is written.
struct RemoveOnFinish {
    directory: PathBuf,
}

impl ProgressCallback for RemoveOnFinish {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.total == Some(info.current) {
            for entry in std::fs::read_dir(&self.directory).unwrap() {
                std::fs::remove_dir_all(entry.unwrap().path()).unwrap();
            }
        }
    }
}

#[test]
fn cleanup_failure_after_writing_still_succeeds() {
    let (directory, path) = sweep_fixture("sweep.gif");
    let output = directory.path().join("book.pdf");
    let scratch = directory.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();

    let options = FlipbookOptions::new()
        .with_working_directory(&scratch)
        .with_batch_size(100)
        .with_progress(Arc::new(RemoveOnFinish {
            directory: scratch.clone(),
        }));
    let summary = Flipbook::open(&path)
        .unwrap()
        .create(&output, &options)
        .expect("a written PDF should not be failed by cleanup");

    assert_eq!(summary.frames, 10);
    assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));
}
