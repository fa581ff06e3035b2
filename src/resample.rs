//! Frame-rate resampling.
//!
//! When a video's native rate differs from the requested output rate, the
//! whole video is re-encoded once, before pagination starts, through an
//! FFmpeg filter graph:
//!
//! ```text
//! buffer -> fps=<rate> -> format=yuv420p -> buffersink
//! ```
//!
//! The filtered frames are encoded losslessly (FFV1 in Matroska) into the
//! run's working directory and the intermediate file is reopened as a fresh
//! [`VideoSource`]. Its frame count is `floor(duration * rate)`, using the
//! duration of the re-encoded file.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::{Id, context::Context as CodecContext},
    decoder::Video as VideoDecoder,
    encoder::Video as VideoEncoder,
    filter::Graph as FilterGraph,
    format::{Pixel, context::Output, flag::Flags as FormatFlags},
    frame::Video as VideoFrame,
};
use ffmpeg_sys_next::AVPixelFormat;

use crate::error::FlipbookError;
use crate::progress::{OperationType, ProgressCallback, ProgressTracker};
use crate::source::VideoSource;

/// File name of the re-encoded video inside the working directory.
pub const INTERMEDIATE_FILE_NAME: &str = "resampled.mkv";

/// Native and requested rates closer than this are considered equal.
pub const FRAME_RATE_TOLERANCE: f64 = 1e-3;

/// Whether a video at `native` fps must be re-encoded to play at
/// `requested` fps.
///
/// An unknown native rate (`0.0`) never triggers resampling.
///
/// # Example
///
/// ```
/// use flipbook::needs_resampling;
///
/// assert!(needs_resampling(30.0, 10));
/// assert!(!needs_resampling(10.0, 10));
/// assert!(!needs_resampling(0.0, 10));
/// ```
pub fn needs_resampling(native: f64, requested: u32) -> bool {
    native > 0.0 && (native - requested as f64).abs() > FRAME_RATE_TOLERANCE
}

/// Number of frames a video of `duration` has at `frames_per_second`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use flipbook::resampled_frame_count;
///
/// assert_eq!(resampled_frame_count(Duration::from_millis(9_550), 10), 95);
/// ```
pub fn resampled_frame_count(duration: Duration, frames_per_second: u32) -> u64 {
    (duration.as_secs_f64() * frames_per_second as f64).floor() as u64
}

/// One-shot re-encoder for a fixed output rate.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    frames_per_second: u32,
}

impl Resampler {
    pub fn new(frames_per_second: u32) -> Self {
        Self { frames_per_second }
    }

    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    /// Re-encode `source` into `directory` and reopen the result.
    ///
    /// # Errors
    ///
    /// - [`FlipbookError::InvalidParameter`] for a zero rate.
    /// - [`FlipbookError::FilterGraphError`] if the filter graph cannot be
    ///   built or fed.
    /// - [`FlipbookError::ResampleError`] for encoder or muxer failures.
    /// - Decode errors from the source.
    pub fn run(
        &self,
        source: VideoSource,
        directory: &Path,
        progress: Arc<dyn ProgressCallback>,
        batch_size: u64,
    ) -> Result<VideoSource, FlipbookError> {
        if self.frames_per_second == 0 {
            return Err(FlipbookError::invalid(
                "frames per second",
                "must be greater than zero",
            ));
        }
        let rate = self.frames_per_second as i32;
        let destination = directory.join(INTERMEDIATE_FILE_NAME);
        let (mut input, stream_index, info) = source.into_parts();

        log::info!(
            "Resampling {:.3} fps -> {} fps into {}",
            info.frames_per_second,
            rate,
            destination.display()
        );

        let (mut decoder, time_base) = {
            let stream = input
                .stream(stream_index)
                .ok_or(FlipbookError::NoVideoStream)?;
            let decoder = CodecContext::from_parameters(stream.parameters())?
                .decoder()
                .video()?;
            (decoder, stream.time_base())
        };

        let mut sink = IntermediateSink::create(&destination, info.width, info.height, rate)?;
        let expected = resampled_frame_count(info.duration, self.frames_per_second);
        let mut tracker = ProgressTracker::new(
            progress,
            OperationType::Resampling,
            Some(expected),
            batch_size,
        );

        let mut graph: Option<FilterGraph> = None;
        let mut decoded = VideoFrame::empty();
        let mut filtered = VideoFrame::empty();

        let mut drain_decoder = |decoder: &mut VideoDecoder,
                                 graph: &mut Option<FilterGraph>,
                                 sink: &mut IntermediateSink,
                                 tracker: &mut ProgressTracker|
         -> Result<(), FlipbookError> {
            while decoder.receive_frame(&mut decoded).is_ok() {
                let timestamp = decoded.timestamp();
                decoded.set_pts(timestamp);
                if graph.is_none() {
                    *graph = Some(build_graph(&decoded, time_base, rate)?);
                }
                if let Some(graph) = graph.as_mut() {
                    feed(graph, Some(&decoded))?;
                    while pull(graph, &mut filtered)? {
                        sink.encode(&mut filtered)?;
                        tracker.advance(Some(sink.frames_written - 1), None);
                    }
                }
            }
            Ok(())
        };

        for (stream, packet) in input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder
                .send_packet(&packet)
                .map_err(|error| FlipbookError::VideoDecodeError(error.to_string()))?;
            drain_decoder(&mut decoder, &mut graph, &mut sink, &mut tracker)?;
        }
        decoder
            .send_eof()
            .map_err(|error| FlipbookError::VideoDecodeError(error.to_string()))?;
        drain_decoder(&mut decoder, &mut graph, &mut sink, &mut tracker)?;

        if let Some(graph) = graph.as_mut() {
            feed(graph, None)?;
            while pull(graph, &mut filtered)? {
                sink.encode(&mut filtered)?;
                tracker.advance(Some(sink.frames_written - 1), None);
            }
        }
        let written = sink.finish()?;
        tracker.finish();

        log::debug!(
            "Resampled video has {} frame(s), {} expected",
            written,
            expected
        );

        let resampled = VideoSource::open(&destination)?;
        let duration = resampled.info().duration;
        let frame_count = if duration.is_zero() {
            expected
        } else {
            resampled_frame_count(duration, self.frames_per_second)
        };
        Ok(resampled.with_frame_rate(self.frames_per_second as f64, frame_count))
    }
}

fn filter_error(stage: &str) -> impl Fn(FfmpegError) -> FlipbookError + '_ {
    move |error| FlipbookError::FilterGraphError(format!("{stage}: {error}"))
}

/// `buffer -> fps -> format -> buffersink`, configured from the first
/// decoded frame so the buffer source matches what the decoder really
/// produces.
fn build_graph(
    first: &VideoFrame,
    time_base: Rational,
    rate: i32,
) -> Result<FilterGraph, FlipbookError> {
    let mut graph = FilterGraph::new();

    let buffer_args = format!(
        "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect=1/1",
        first.width(),
        first.height(),
        AVPixelFormat::from(first.format()) as i32,
        time_base.numerator(),
        time_base.denominator(),
    );
    let buffer = ffmpeg_next::filter::find("buffer").ok_or_else(|| {
        FlipbookError::FilterGraphError("FFmpeg 'buffer' filter not found".to_string())
    })?;
    let buffersink = ffmpeg_next::filter::find("buffersink").ok_or_else(|| {
        FlipbookError::FilterGraphError("FFmpeg 'buffersink' filter not found".to_string())
    })?;

    graph
        .add(&buffer, "in", &buffer_args)
        .map_err(filter_error("cannot add buffer filter"))?;
    graph
        .add(&buffersink, "out", "")
        .map_err(filter_error("cannot add buffersink filter"))?;

    let spec = format!("fps={rate},format=pix_fmts=yuv420p");
    graph
        .output("in", 0)
        .map_err(filter_error("graph output"))?
        .input("out", 0)
        .map_err(filter_error("graph input"))?
        .parse(&spec)
        .map_err(filter_error("cannot parse filter spec"))?;
    graph.validate().map_err(filter_error("validation"))?;

    log::debug!("Filter graph: {buffer_args} -> {spec}");
    Ok(graph)
}

/// Push a frame into the graph, or flush it with `None`.
fn feed(graph: &mut FilterGraph, frame: Option<&VideoFrame>) -> Result<(), FlipbookError> {
    let mut context = graph
        .get("in")
        .ok_or_else(|| FlipbookError::FilterGraphError("filter 'in' not found".to_string()))?;
    let mut source = context.source();
    match frame {
        Some(frame) => source.add(frame),
        None => source.flush(),
    }
    .map_err(filter_error("cannot feed filter graph"))
}

/// Pull one filtered frame. `Ok(false)` when the graph needs more input or
/// is drained.
fn pull(graph: &mut FilterGraph, frame: &mut VideoFrame) -> Result<bool, FlipbookError> {
    let mut context = graph
        .get("out")
        .ok_or_else(|| FlipbookError::FilterGraphError("filter 'out' not found".to_string()))?;
    Ok(context.sink().frame(frame).is_ok())
}

/// FFV1/Matroska writer for the resampled frames.
struct IntermediateSink {
    output: Output,
    encoder: VideoEncoder,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    frames_written: u64,
}

impl IntermediateSink {
    fn create(path: &Path, width: u32, height: u32, rate: i32) -> Result<Self, FlipbookError> {
        let resample_error =
            |stage: &str, error: FfmpegError| FlipbookError::ResampleError(format!("{stage}: {error}"));

        let mut output = ffmpeg_next::format::output(path)
            .map_err(|error| resample_error("cannot open intermediate file", error))?;
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(Id::FFV1).ok_or_else(|| {
            FlipbookError::ResampleError("FFV1 encoder not available".to_string())
        })?;
        let mut stream = output
            .add_stream(codec)
            .map_err(|error| resample_error("cannot add stream", error))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.encoder().video())
            .map_err(|error| resample_error("cannot create encoder", error))?;

        let encoder_time_base = Rational::new(1, rate);
        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(Rational::new(rate, 1)));
        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = encoder
            .open_as(codec)
            .map_err(|error| resample_error("cannot open encoder", error))?;
        stream.set_parameters(&encoder);
        stream.set_time_base(encoder_time_base);

        output
            .write_header()
            .map_err(|error| resample_error("cannot write header", error))?;
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| FlipbookError::ResampleError("output stream vanished".to_string()))?;

        Ok(Self {
            output,
            encoder,
            stream_index,
            encoder_time_base,
            stream_time_base,
            frames_written: 0,
        })
    }

    fn encode(&mut self, frame: &mut VideoFrame) -> Result<(), FlipbookError> {
        frame.set_pts(Some(self.frames_written as i64));
        self.encoder
            .send_frame(frame)
            .map_err(|error| FlipbookError::ResampleError(format!("send_frame failed: {error}")))?;
        self.frames_written += 1;
        self.write_packets()
    }

    fn write_packets(&mut self) -> Result<(), FlipbookError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet.write_interleaved(&mut self.output).map_err(|error| {
                FlipbookError::ResampleError(format!("cannot write packet: {error}"))
            })?;
        }
        Ok(())
    }

    /// Flush the encoder and close the file. Returns the number of frames
    /// written.
    fn finish(mut self) -> Result<u64, FlipbookError> {
        self.encoder
            .send_eof()
            .map_err(|error| FlipbookError::ResampleError(format!("send_eof failed: {error}")))?;
        self.write_packets()?;
        self.output
            .write_trailer()
            .map_err(|error| FlipbookError::ResampleError(format!("cannot write trailer: {error}")))?;
        Ok(self.frames_written)
    }
}
