//! Convert an animated GIF (or a video) into a flip-book PDF.
//!
//! Usage:
//!   cargo run --example gif_to_pdf -- <input_file> [output.pdf]

use std::error::Error;

use flipbook::{Flipbook, FlipbookOptions, PaperSize};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let input_path = args.next().unwrap_or_else(|| "input.gif".to_string());
    let output_path = args.next().unwrap_or_else(|| "flip-book.pdf".to_string());

    println!("Opening {input_path}...");
    let flipbook = Flipbook::open(&input_path)?;
    let info = flipbook.info();
    println!(
        "{}x{}, {} frame(s), {:.2}s",
        info.width,
        info.height,
        info.frame_count,
        info.duration.as_secs_f64()
    );

    let options = FlipbookOptions::new()
        .with_paper(PaperSize::A4)
        .with_frame_height(35.0)
        .with_title("GIF flip-book");

    let layout = flipbook.layout(&options)?;
    println!(
        "{} x {} frames per page, {} page(s) expected",
        layout.columns,
        layout.rows,
        layout.page_count(info.frame_count)
    );

    let summary = flipbook.create(&output_path, &options)?;
    println!(
        "Wrote {} frame(s) on {} page(s) to {output_path}",
        summary.frames, summary.pages
    );
    Ok(())
}
