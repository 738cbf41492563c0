//! Sequential RGB frame decoding.
//!
//! [`FrameSource`] opens a video container through FFmpeg and decodes its
//! best video stream front to back, one frame per call. The demuxer, decoder
//! and scaler are owned by the source and released when it is dropped, so a
//! job that fails half way through a video still frees them.
//!
//! # Example
//!
//! ```no_run
//! use facereel::FrameSource;
//!
//! let mut source = FrameSource::open("input.mp4")?;
//! while let Some(frame) = source.next_frame()? {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! source.close();
//! # Ok::<(), facereel::AnnotateError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::error::AnnotateError;
use crate::ffmpeg;
use crate::Frame;

/// Consecutive demuxer read failures tolerated before the video is declared
/// unreadable.
const MAX_READ_FAILURES: u32 = 64;

/// Stream information captured when a [`FrameSource`] is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frame rate reported by the container, `0.0` when unknown.
    pub frames_per_second: f64,
    /// Estimated number of frames (duration × frame rate), `0` when unknown.
    pub frame_count: u64,
}

/// A decoder handle over one video file.
pub struct FrameSource {
    path: PathBuf,
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    info: VideoInfo,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    eof_sent: bool,
    done: bool,
}

impl Debug for FrameSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameSource")
            .field("path", &self.path)
            .field("video_stream_index", &self.video_stream_index)
            .field("info", &self.info)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl FrameSource {
    /// Open `path` and prepare a decoder for its best video stream.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotateError::UnreadableVideo`] if the container cannot be
    /// opened, holds no video stream, or its codec cannot be decoded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnnotateError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video: {}", path.display());

        ffmpeg::init()?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|e| AnnotateError::unreadable(&path, e))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| AnnotateError::unreadable(&path, "no video stream found"))?;
        let video_stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|e| AnnotateError::unreadable(&path, format!("bad codec parameters: {e}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|e| AnnotateError::unreadable(&path, format!("cannot create decoder: {e}")))?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            0.0
        };

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let info = VideoInfo {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count: (duration.as_secs_f64() * frames_per_second) as u64,
        };

        if info.width == 0 || info.height == 0 {
            return Err(AnnotateError::unreadable(&path, "video stream has no dimensions"));
        }

        let scaler = ScalingContext::get(
            decoder.format(),
            info.width,
            info.height,
            Pixel::RGB24,
            info.width,
            info.height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| AnnotateError::unreadable(&path, format!("cannot create scaler: {e}")))?;

        log::debug!(
            "Decoding {} ({}x{}, {:.2} fps, ~{} frames)",
            path.display(),
            info.width,
            info.height,
            info.frames_per_second,
            info.frame_count,
        );

        Ok(Self {
            path,
            input_context,
            decoder,
            scaler,
            video_stream_index,
            info,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            eof_sent: false,
            done: false,
        })
    }

    /// Stream information captured at open time.
    pub fn metadata(&self) -> VideoInfo {
        self.info
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the next frame in decode order.
    ///
    /// Returns `Ok(None)` once the stream is exhausted; every later call
    /// returns `Ok(None)` as well.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotateError::UnreadableVideo`] when a packet cannot be
    /// decoded or the decoded frame cannot be converted to RGB.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, AnnotateError> {
        if self.done {
            return Ok(None);
        }

        let mut read_failures = 0;
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return match self.convert_current_frame() {
                    Ok(frame) => Ok(Some(frame)),
                    Err(error) => {
                        self.done = true;
                        Err(error)
                    }
                };
            }

            if self.eof_sent {
                self.done = true;
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    read_failures = 0;
                    if packet.stream() == self.video_stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            self.done = true;
                            return Err(AnnotateError::unreadable(
                                &self.path,
                                format!("decode failed: {error}"),
                            ));
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        self.done = true;
                        return Err(AnnotateError::unreadable(
                            &self.path,
                            format!("decoder flush failed: {error}"),
                        ));
                    }
                    self.eof_sent = true;
                }
                Err(error) => {
                    read_failures += 1;
                    if read_failures >= MAX_READ_FAILURES {
                        self.done = true;
                        return Err(AnnotateError::unreadable(
                            &self.path,
                            format!("demuxing failed: {error}"),
                        ));
                    }
                }
            }
        }
    }

    /// Release the decoder. Dropping the source has the same effect.
    pub fn close(self) {
        log::debug!("Closing video: {}", self.path.display());
    }

    fn convert_current_frame(&mut self) -> Result<Frame, AnnotateError> {
        self.scaler
            .run(&self.decoded_frame, &mut self.scaled_frame)
            .map_err(|e| AnnotateError::unreadable(&self.path, format!("scaling failed: {e}")))?;

        ffmpeg::frame_to_rgb_image(&self.scaled_frame).ok_or_else(|| {
            AnnotateError::unreadable(&self.path, "decoded frame has an inconsistent size")
        })
    }
}

impl Iterator for FrameSource {
    type Item = Result<Frame, AnnotateError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
