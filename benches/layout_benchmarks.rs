//! Benchmarks for layout, pagination and the full conversion.
//!
//! Run with: cargo bench
//!
//! The end-to-end benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path, time::Duration};

use criterion::Criterion;
use flipbook::{
    DocumentWriter, Flipbook, FlipbookError, FlipbookOptions, FrameRenderer, Margin,
    PaginationState, PaperSize, PixelSize, compute_layout, paginate,
};
use image::{DynamicImage, Rgb, RgbImage};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// Discards every drawing command.
struct NullWriter;

impl DocumentWriter for NullWriter {
    fn new_page(&mut self) -> Result<(), FlipbookError> {
        Ok(())
    }

    fn place_image(
        &mut self,
        _path: &Path,
        _x: f64,
        _y: f64,
        _width: f64,
        _height: f64,
    ) -> Result<(), FlipbookError> {
        Ok(())
    }

    fn draw_line(&mut self, _x0: f64, _y0: f64, _x1: f64, _y1: f64) -> Result<(), FlipbookError> {
        Ok(())
    }

    fn draw_rotated_text(
        &mut self,
        _text: &str,
        _x: f64,
        _y: f64,
        _angle: f64,
    ) -> Result<(), FlipbookError> {
        Ok(())
    }

    fn finalize(&mut self, _path: &Path) -> Result<(), FlipbookError> {
        Ok(())
    }
}

fn benchmark_layout(criterion: &mut Criterion) {
    criterion.bench_function("compute layout (every paper size)", |bencher| {
        bencher.iter(|| {
            for paper in PaperSize::ALL {
                let layout = compute_layout(
                    black_box(paper),
                    Margin::default(),
                    black_box(30.0),
                    16.0 / 9.0,
                    200,
                    15.0,
                )
                .unwrap();
                black_box(layout);
            }
        });
    });

    let layout =
        compute_layout(PaperSize::A4, Margin::default(), 30.0, 16.0 / 9.0, 200, 15.0).unwrap();

    criterion.bench_function("placement of 10k frames", |bencher| {
        bencher.iter(|| {
            for index in 0..10_000 {
                black_box(layout.placement(black_box(index)));
            }
        });
    });

    criterion.bench_function("pagination state walk of 10k frames", |bencher| {
        bencher.iter(|| {
            let mut state = PaginationState::new();
            for _ in 0..10_000 {
                state = state.advance(&layout).state.placed();
            }
            black_box(state);
        });
    });

    criterion.bench_function("ruling of a full page", |bencher| {
        bencher.iter(|| black_box(layout.ruling(black_box(layout.rows))));
    });
}

fn benchmark_pagination(criterion: &mut Criterion) {
    let layout =
        compute_layout(PaperSize::A4, Margin::default(), 30.0, 16.0 / 9.0, 200, 15.0).unwrap();
    let directory = tempfile::tempdir().unwrap();
    let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 360, Rgb([90, 140, 200])));

    let mut group = criterion.benchmark_group("pagination");
    group.sample_size(10);

    group.bench_function("render and place 48 frames", |bencher| {
        let renderer = FrameRenderer::new(directory.path(), layout.frame_pixels, 90);
        let options = FlipbookOptions::new();
        bencher.iter(|| {
            let frames = (0..48).map(|_| Ok(frame.clone()));
            paginate(&layout, frames, 48, &renderer, &mut NullWriter, &options).unwrap()
        });
    });

    group.bench_function("downscale one 640x360 frame", |bencher| {
        let renderer = FrameRenderer::new(directory.path(), PixelSize::new(420, 236), 90);
        bencher.iter(|| black_box(renderer.downscale(&frame)));
    });

    group.finish();
}

fn benchmark_end_to_end(criterion: &mut Criterion) {
    flipbook::set_ffmpeg_log_level(flipbook::FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("bench.pdf");

    let mut group = criterion.benchmark_group("end to end");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    group.bench_function("video to PDF at native rate", |bencher| {
        let options = FlipbookOptions::new().with_frames_per_second(30);
        bencher.iter(|| {
            Flipbook::open(SAMPLE_VIDEO)
                .unwrap()
                .create(&output, &options)
                .unwrap()
        });
    });

    group.bench_function("video to PDF resampled to 10 fps", |bencher| {
        let options = FlipbookOptions::new().with_frames_per_second(10);
        bencher.iter(|| {
            Flipbook::open(SAMPLE_VIDEO)
                .unwrap()
                .create(&output, &options)
                .unwrap()
        });
    });

    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_layout,
    benchmark_pagination,
    benchmark_end_to_end
);
criterion::criterion_main!(benches);
