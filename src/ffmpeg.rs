//! FFmpeg plumbing shared by the decoder and the encoder.
//!
//! FFmpeg keeps its own console logging, separate from the Rust
//! [`log`](https://crates.io/crates/log) facade. [`set_ffmpeg_log_level`]
//! tunes it so batch runs are not flooded with codec chatter unless
//! `--debug` is requested.

use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::util::log::Level;
use image::RgbImage;

use crate::error::AnnotateError;

/// FFmpeg internal log verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Log recoverable errors.
    Error,
    /// Log warnings (FFmpeg's own default).
    Warning,
    /// Log informational messages such as stream and codec setup.
    Info,
    /// Log debugging messages.
    Debug,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

/// Set the FFmpeg internal log verbosity level.
///
/// This does **not** affect Rust-side `log` output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Initialise FFmpeg. Safe to call more than once.
pub(crate) fn init() -> Result<(), AnnotateError> {
    ffmpeg_next::init()
        .map_err(|error| AnnotateError::Ffmpeg(format!("initialisation failed: {error}")))
}

/// Copy an RGB24 FFmpeg frame into a tightly packed [`RgbImage`].
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3), which
/// is stripped here.
pub(crate) fn frame_to_rgb_image(video_frame: &VideoFrame) -> Option<RgbImage> {
    let width = video_frame.width();
    let height = video_frame.height();
    let stride = video_frame.stride(0);
    let row_len = (width as usize) * 3;
    let data = video_frame.data(0);

    let buffer = if stride == row_len {
        data[..row_len * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_len * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_len]);
        }
        buffer
    };

    RgbImage::from_raw(width, height, buffer)
}

/// Copy an [`RgbImage`] into a freshly allocated RGB24 FFmpeg frame,
/// honouring the frame's stride.
pub(crate) fn rgb_image_to_frame(image: &RgbImage) -> VideoFrame {
    let (width, height) = image.dimensions();
    let mut frame = VideoFrame::new(Pixel::RGB24, width, height);
    let stride = frame.stride(0);
    let row_len = (width as usize) * 3;
    let source = image.as_raw();
    let destination = frame.data_mut(0);

    for row in 0..height as usize {
        let src_start = row * row_len;
        let dst_start = row * stride;
        destination[dst_start..dst_start + row_len]
            .copy_from_slice(&source[src_start..src_start + row_len]);
    }

    frame
}
