//! Video containers decoded through FFmpeg.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use super::SourceInfo;
use crate::error::FlipbookError;

/// An opened video file.
///
/// Holds the demuxer and the metadata of its best video stream. Decoding
/// starts with [`into_frames`](VideoSource::into_frames).
pub struct VideoSource {
    input: Input,
    stream_index: usize,
    info: SourceInfo,
    path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("stream_index", &self.stream_index)
            .field("info", &self.info)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open `path` and read the metadata of its best video stream.
    ///
    /// Initializes FFmpeg; calling this repeatedly is fine.
    ///
    /// # Errors
    ///
    /// - [`FlipbookError::FileOpen`] if FFmpeg cannot open the file or its
    ///   decoder.
    /// - [`FlipbookError::NoVideoStream`] if there is no video stream.
    /// - [`FlipbookError::VideoDecodeError`] if the stream reports a zero
    ///   frame size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FlipbookError> {
        let path = path.as_ref().to_path_buf();
        let file_open = |reason: String| FlipbookError::FileOpen {
            path: path.clone(),
            reason,
        };

        log::debug!("Opening video: {}", path.display());
        ffmpeg_next::init()
            .map_err(|error| file_open(format!("FFmpeg initialisation failed: {error}")))?;
        let input = ffmpeg_next::format::input(&path).map_err(|error| file_open(error.to_string()))?;

        let (stream_index, info) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or(FlipbookError::NoVideoStream)?;

            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| file_open(format!("cannot create video decoder: {error}")))?;
            let (width, height) = (decoder.width(), decoder.height());
            if width == 0 || height == 0 {
                return Err(FlipbookError::VideoDecodeError(format!(
                    "video stream reports a frame size of {width}x{height}"
                )));
            }

            let frames_per_second = rational_to_f64(stream.avg_frame_rate())
                .or_else(|| rational_to_f64(stream.rate()))
                .unwrap_or(0.0);

            let duration = if input.duration() > 0 {
                Duration::from_micros(input.duration() as u64)
            } else if stream.duration() > 0 {
                let time_base = stream.time_base();
                Duration::from_secs_f64(
                    stream.duration() as f64 * time_base.numerator() as f64
                        / time_base.denominator() as f64,
                )
            } else {
                Duration::ZERO
            };

            let frame_count = if stream.frames() > 0 {
                stream.frames() as u64
            } else {
                (duration.as_secs_f64() * frames_per_second) as u64
            };

            (
                stream.index(),
                SourceInfo {
                    frame_count,
                    frames_per_second,
                    width,
                    height,
                    duration,
                },
            )
        };

        log::debug!(
            "Video stream {}: {}x{} @ {:.3} fps, {:?}, ~{} frames",
            stream_index,
            info.width,
            info.height,
            info.frames_per_second,
            info.duration,
            info.frame_count,
        );

        Ok(Self {
            input,
            stream_index,
            info,
            path,
        })
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start decoding from the first frame.
    ///
    /// # Errors
    ///
    /// FFmpeg errors while setting up the decoder or scaler.
    pub fn into_frames(self) -> Result<VideoFrames, FlipbookError> {
        let stream = self
            .input
            .stream(self.stream_index)
            .ok_or(FlipbookError::NoVideoStream)?;
        let decoder = CodecContext::from_parameters(stream.parameters())?
            .decoder()
            .video()?;

        let (width, height) = (decoder.width(), decoder.height());
        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        Ok(VideoFrames {
            input: self.input,
            decoder,
            scaler,
            stream_index: self.stream_index,
            width,
            height,
            decoded: VideoFrame::empty(),
            scaled: VideoFrame::empty(),
            eof_sent: false,
            done: false,
        })
    }

    /// Override the rate and frame count read from the container, for an
    /// intermediate whose container metadata is less exact than what the
    /// resampler knows.
    pub(crate) fn with_frame_rate(mut self, frames_per_second: f64, frame_count: u64) -> Self {
        self.info.frames_per_second = frames_per_second;
        self.info.frame_count = frame_count;
        self
    }

    /// Split into the demuxer and decoder pieces the resampler needs.
    pub(crate) fn into_parts(self) -> (Input, usize, SourceInfo) {
        (self.input, self.stream_index, self.info)
    }
}

/// Lazy iterator over the decoded frames of a [`VideoSource`], converted
/// to RGB at native size.
///
/// Packets are read and decoded only as frames are requested. The first
/// error ends iteration.
pub struct VideoFrames {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    width: u32,
    height: u32,
    decoded: VideoFrame,
    scaled: VideoFrame,
    eof_sent: bool,
    done: bool,
}

impl VideoFrames {
    fn convert_current_frame(&mut self) -> Result<DynamicImage, FlipbookError> {
        self.scaler.run(&self.decoded, &mut self.scaled)?;
        let buffer = packed_plane(&self.scaled, self.width, self.height, 3);
        let image = RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            FlipbookError::VideoDecodeError(
                "decoded frame does not match the stream's frame size".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(image))
    }

    fn fail(&mut self, error: FlipbookError) -> Option<Result<DynamicImage, FlipbookError>> {
        self.done = true;
        Some(Err(error))
    }
}

impl Iterator for VideoFrames {
    type Item = Result<DynamicImage, FlipbookError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if self.decoder.receive_frame(&mut self.decoded).is_ok() {
                return match self.convert_current_frame() {
                    Ok(image) => Some(Ok(image)),
                    Err(error) => self.fail(error),
                };
            }

            if self.eof_sent {
                self.done = true;
                return None;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            return self.fail(FlipbookError::VideoDecodeError(error.to_string()));
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        return self.fail(FlipbookError::VideoDecodeError(error.to_string()));
                    }
                    self.eof_sent = true;
                }
                Err(error) => {
                    return self.fail(FlipbookError::VideoDecodeError(error.to_string()));
                }
            }
        }
    }
}

fn rational_to_f64(rational: Rational) -> Option<f64> {
    if rational.numerator() > 0 && rational.denominator() > 0 {
        Some(rational.numerator() as f64 / rational.denominator() as f64)
    } else {
        None
    }
}

/// Copy the first plane of `frame` into a tightly packed buffer, dropping
/// any per-row padding FFmpeg added.
fn packed_plane(
    frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_length = width as usize * bytes_per_pixel;
    let data = frame.data(0);

    if stride == row_length {
        return data[..row_length * height as usize].to_vec();
    }
    let mut buffer = Vec::with_capacity(row_length * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        buffer.extend_from_slice(&data[start..start + row_length]);
    }
    buffer
}
