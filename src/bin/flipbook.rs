use std::{
    error::Error,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::Parser;
use colored::Colorize;
use flipbook::{
    DocumentMetadata, FfmpegLogLevel, Flipbook, FlipbookOptions, FlipbookSummary, Margin,
    OperationType, PaperSize, ProgressCallback, ProgressInfo,
    configuration::{
        DEFAULT_BINDING_OFFSET_MM, DEFAULT_DPI, DEFAULT_FRAME_HEIGHT_MM,
        DEFAULT_FRAMES_PER_SECOND, DEFAULT_JPEG_QUALITY,
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  flipbook --input clip.mp4\n  flipbook --input clip.mp4 --output book.pdf --paper a3 --height 40 --fps 12 --progress\n  flipbook --input loop.gif --offset 0 --dpi 300\n  flipbook --input clip.mov --json -v 0";

#[derive(Debug, Parser)]
#[command(
    name = "flipbook",
    version,
    about = "Turn a video or animated GIF into a printable flip-book PDF",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Video or animated GIF to convert.
    #[arg(short, long)]
    input: PathBuf,

    /// Output PDF path.
    #[arg(short, long, default_value = "flip-book.pdf")]
    output: PathBuf,

    /// Printed frame height in millimetres.
    #[arg(long, default_value_t = DEFAULT_FRAME_HEIGHT_MM)]
    height: f64,

    /// Paper size (a5, a4, a3, letter, legal). Pages are always landscape.
    #[arg(long, default_value = "a4")]
    paper: String,

    /// Binding strip width in millimetres. 0 disables sequence labels.
    #[arg(long, default_value_t = DEFAULT_BINDING_OFFSET_MM)]
    offset: f64,

    /// Resolution frames are downscaled to.
    #[arg(long, default_value_t = DEFAULT_DPI)]
    dpi: u32,

    /// Output frames per second (videos only).
    #[arg(long, default_value_t = DEFAULT_FRAMES_PER_SECOND)]
    fps: u32,

    /// Page margin in millimetres, on all four sides.
    #[arg(long, default_value_t = 10.0)]
    margin: f64,

    /// JPEG quality of embedded frames (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
    quality: u8,

    /// Document title.
    #[arg(long)]
    title: Option<String>,

    /// Document author.
    #[arg(long)]
    author: Option<String>,

    /// Verbosity: 0 warnings only, 1 progress messages, 2 debug, 3 trace.
    #[arg(short = 'v', default_value_t = 1, num_args = 0..=1, default_missing_value = "2")]
    verbosity: u8,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting an existing output file.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg log level (quiet, error, warning, info, debug).
    #[arg(long)]
    ffmpeg_log_level: Option<String>,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
}

fn log_level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(log_level_filter(verbosity))
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn build_options(cli: &Cli) -> Result<FlipbookOptions, Box<dyn Error>> {
    let paper: PaperSize = cli.paper.parse()?;
    let metadata = DocumentMetadata {
        title: cli
            .title
            .clone()
            .unwrap_or_else(|| DocumentMetadata::default().title),
        author: cli.author.clone(),
        ..DocumentMetadata::default()
    };

    let options = FlipbookOptions::new()
        .with_paper(paper)
        .with_margins(Margin::uniform(cli.margin))
        .with_frame_height(cli.height)
        .with_dpi(cli.dpi)
        .with_frames_per_second(cli.fps)
        .with_binding_offset(cli.offset)
        .with_jpeg_quality(cli.quality)
        .with_metadata(metadata);
    options.validate()?;
    Ok(options)
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg:>10} {bar:40.cyan/blue} {pos}/{len} ({eta})",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let stage = match info.operation {
            OperationType::Resampling => "resampling",
            OperationType::Pagination => "paginating",
            _ => "working",
        };
        if let Some(total) = info.total {
            self.bar.set_length(total.max(info.current));
        }
        self.bar.set_position(info.current);
        self.bar.set_message(stage);
    }
}

fn print_summary(output: &Path, summary: &FlipbookSummary, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        let payload = json!({
            "output": output.display().to_string(),
            "frames": summary.frames,
            "pages": summary.pages,
            "columns": summary.columns,
            "rows": summary.rows,
            "frame_size_mm": {
                "width": summary.frame_size.width,
                "height": summary.frame_size.height,
            },
            "frame_size_px": {
                "width": summary.frame_pixels.width,
                "height": summary.frame_pixels.height,
            },
            "resampled": summary.resampled,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{} {}",
            "success:".green().bold(),
            format!(
                "{} frame(s) on {} page(s) ({}x{} per page) -> {}",
                summary.frames,
                summary.pages,
                summary.columns,
                summary.rows,
                output.display()
            )
            .green()
        );
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    let ffmpeg_level = match &cli.ffmpeg_log_level {
        Some(level) => level.parse::<FfmpegLogLevel>()?,
        None => FfmpegLogLevel::for_verbosity(cli.verbosity),
    };
    flipbook::set_ffmpeg_log_level(ffmpeg_level);

    let mut options = build_options(&cli)?;
    ensure_writable_path(&cli.output, cli.overwrite)?;

    let progress = if cli.progress {
        let progress = Arc::new(TerminalProgress::new()?);
        options = options.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let summary = Flipbook::open(&cli.input)?.create(&cli.output, &options)?;
    if let Some(progress) = progress {
        progress.finish();
    }

    print_summary(&cli.output, &summary, cli.json)
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
