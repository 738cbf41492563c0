//! Re-encoding a directory of numbered frames into one video.
//!
//! [`VideoAssembler`] lists an image directory, orders the files naturally
//! (`v_2.png` before `v_10.png`), and streams them one at a time through an
//! FFmpeg encoder at a fixed frame rate.
//!
//! # Example
//!
//! ```no_run
//! use facereel::{AssemblerOptions, VideoAssembler};
//!
//! let options = AssemblerOptions::default().fps(25).output("final_out.mp4");
//! let video = VideoAssembler::new(options).build("treated_dir")?;
//! println!("wrote {}", video.display());
//! # Ok::<(), facereel::AnnotateError>(())
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::encoder::video::Encoder as VideoEncoder;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Packet, Rational};
use image::RgbImage;
use image::imageops::FilterType;

use crate::error::AnnotateError;
use crate::ffmpeg;
use crate::natural;
use crate::progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker};

/// Frame rate of the assembled video.
pub const DEFAULT_OUTPUT_FPS: u32 = 25;
/// File the assembled video is written to.
pub const DEFAULT_OUTPUT_VIDEO: &str = "final_out.mp4";

/// Options for the re-encoding pass.
#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    /// Output frames per second (default: 25).
    pub fps: u32,
    /// Codec to use. Default is H.264.
    pub codec: VideoCodec,
    /// Output path; the container is inferred from its extension.
    pub output: PathBuf,
    /// Bitrate in bits per second. `None` leaves the encoder default.
    pub bitrate: Option<usize>,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_OUTPUT_FPS,
            codec: VideoCodec::H264,
            output: PathBuf::from(DEFAULT_OUTPUT_VIDEO),
            bitrate: None,
        }
    }
}

impl AssemblerOptions {
    /// Set the frame rate.
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the codec.
    pub fn codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the output path.
    pub fn output<P: AsRef<Path>>(mut self, output: P) -> Self {
        self.output = output.as_ref().to_path_buf();
        self
    }

    /// Set the target bitrate in bits per second.
    pub fn bitrate(mut self, bitrate: usize) -> Self {
        self.bitrate = Some(bitrate);
        self
    }
}

/// Supported output video codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// H.264 / AVC.
    H264,
    /// H.265 / HEVC.
    H265,
    /// MPEG-4 Part 2, available in most FFmpeg builds.
    Mpeg4,
}

impl VideoCodec {
    fn to_codec_id(self) -> Id {
        match self {
            VideoCodec::H264 => Id::H264,
            VideoCodec::H265 => Id::HEVC,
            VideoCodec::Mpeg4 => Id::MPEG4,
        }
    }
}

/// Encodes an image directory into a single video.
pub struct VideoAssembler {
    options: AssemblerOptions,
    progress: Arc<dyn ProgressCallback>,
}

impl VideoAssembler {
    pub fn new(options: AssemblerOptions) -> Self {
        Self {
            options,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Report one progress tick per encoded image.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    pub fn options(&self) -> &AssemblerOptions {
        &self.options
    }

    /// Encode every file of `image_dir`, in natural order, into the output
    /// video and return its path.
    ///
    /// Frames whose size differs from the first image are resized to it.
    /// Odd dimensions are rounded down to even, as 4:2:0 chroma requires.
    ///
    /// # Errors
    ///
    /// - [`AnnotateError::InvalidInterval`] if the frame rate is zero or does
    ///   not fit a time base.
    /// - [`AnnotateError::Encode`] if the directory cannot be listed or is
    ///   empty, an image cannot be decoded, or the writer fails.
    pub fn build<P: AsRef<Path>>(&self, image_dir: P) -> Result<PathBuf, AnnotateError> {
        let image_dir = image_dir.as_ref();
        let fps = match i32::try_from(self.options.fps) {
            Ok(fps) if fps > 0 => fps,
            _ => return Err(AnnotateError::InvalidInterval),
        };

        let files = list_frames(image_dir)?;
        let Some(first_path) = files.first() else {
            return Err(AnnotateError::Encode(format!(
                "no frames to assemble in {}",
                image_dir.display()
            )));
        };
        warn_on_mixed_sequences(&files);

        let first = load_frame(first_path)?;
        let width = first.width() & !1;
        let height = first.height() & !1;
        if width == 0 || height == 0 {
            return Err(AnnotateError::Encode(format!(
                "{} is too small to encode ({}x{})",
                first_path.display(),
                first.width(),
                first.height()
            )));
        }

        log::info!(
            "Assembling {} frames from {} into {} (codec={:?}, fps={})",
            files.len(),
            image_dir.display(),
            self.options.output.display(),
            self.options.codec,
            self.options.fps,
        );

        ffmpeg::init().map_err(|e| AnnotateError::Encode(e.to_string()))?;

        let path = self.options.output.as_path();
        let encoder_time_base = Rational::new(1, fps);
        let codec_id = self.options.codec.to_codec_id();

        let mut output = ffmpeg_next::format::output(&path)
            .map_err(|e| AnnotateError::Encode(format!("cannot open output: {e}")))?;

        // Must be read before the stream borrows the output context.
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let encoder_codec = ffmpeg_next::encoder::find(codec_id)
            .ok_or_else(|| AnnotateError::Encode(format!("codec {codec_id:?} not available")))?;

        let mut stream = output
            .add_stream(encoder_codec)
            .map_err(|e| AnnotateError::Encode(format!("cannot add stream: {e}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .map_err(|e| AnnotateError::Encode(format!("cannot create codec context: {e}")))?
            .encoder()
            .video()
            .map_err(|e| AnnotateError::Encode(format!("cannot open video encoder: {e}")))?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(Rational::new(fps, 1)));
        if let Some(bitrate) = self.options.bitrate {
            encoder.set_bit_rate(bitrate);
        }

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let mut opened_encoder = encoder
            .open_as(encoder_codec)
            .map_err(|e| AnnotateError::Encode(format!("cannot open encoder: {e}")))?;
        stream.set_parameters(&opened_encoder);
        stream.set_time_base(encoder_time_base);

        output
            .write_header()
            .map_err(|e| AnnotateError::Encode(format!("cannot write header: {e}")))?;

        // The muxer may pick its own time base while writing the header.
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| AnnotateError::Encode("output stream disappeared".to_string()))?;

        let mut scaler = ScalingContext::get(
            Pixel::RGB24,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| AnnotateError::Encode(format!("cannot create scaler: {e}")))?;

        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.progress),
            OperationType::Assembly,
            Some(files.len() as u64),
            Some(image_dir.to_path_buf()),
        );

        let mut pending_first = Some(first);
        for (index, file) in files.iter().enumerate() {
            let image = match pending_first.take() {
                Some(image) => image,
                None => load_frame(file)?,
            };
            let image = if image.dimensions() != (width, height) {
                image::imageops::resize(&image, width, height, FilterType::Triangle)
            } else {
                image
            };

            let source_frame = ffmpeg::rgb_image_to_frame(&image);
            let mut yuv_frame = VideoFrame::empty();
            scaler
                .run(&source_frame, &mut yuv_frame)
                .map_err(|e| AnnotateError::Encode(format!("scaling failed: {e}")))?;
            yuv_frame.set_pts(Some(index as i64));

            opened_encoder
                .send_frame(&yuv_frame)
                .map_err(|e| AnnotateError::Encode(format!("send_frame failed: {e}")))?;
            write_pending_packets(
                &mut opened_encoder,
                &mut output,
                stream_index,
                encoder_time_base,
                stream_time_base,
            )?;
            tracker.advance();
        }

        opened_encoder
            .send_eof()
            .map_err(|e| AnnotateError::Encode(format!("send_eof failed: {e}")))?;
        write_pending_packets(
            &mut opened_encoder,
            &mut output,
            stream_index,
            encoder_time_base,
            stream_time_base,
        )?;

        output
            .write_trailer()
            .map_err(|e| AnnotateError::Encode(format!("cannot write trailer: {e}")))?;
        tracker.finish();

        log::info!("Wrote {}", path.display());
        Ok(path.to_path_buf())
    }
}

/// Regular files of `image_dir` in natural order of their names.
pub fn list_frames(image_dir: &Path) -> Result<Vec<PathBuf>, AnnotateError> {
    let entries = std::fs::read_dir(image_dir).map_err(|e| {
        AnnotateError::Encode(format!("cannot list {}: {e}", image_dir.display()))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            AnnotateError::Encode(format!("cannot list {}: {e}", image_dir.display()))
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    natural::sort_paths(&mut files);
    Ok(files)
}

fn load_frame(path: &Path) -> Result<RgbImage, AnnotateError> {
    image::open(path)
        .map(|image| image.to_rgb8())
        .map_err(|e| AnnotateError::Encode(format!("cannot decode {}: {e}", path.display())))
}

fn write_pending_packets(
    encoder: &mut VideoEncoder,
    output: &mut Output,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
) -> Result<(), AnnotateError> {
    let mut packet = Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts(encoder_time_base, stream_time_base);
        packet
            .write_interleaved(output)
            .map_err(|e| AnnotateError::Encode(format!("write packet failed: {e}")))?;
    }
    Ok(())
}

/// Frames named `{basename}_{index}` from several videos only interleave by
/// name, so say so when a directory mixes them.
fn warn_on_mixed_sequences(files: &[PathBuf]) {
    let basenames: BTreeSet<String> = files
        .iter()
        .filter_map(|path| path.file_stem())
        .map(|stem| {
            let stem = stem.to_string_lossy();
            match stem.rsplit_once('_') {
                Some((basename, _)) => basename.to_string(),
                None => stem.into_owned(),
            }
        })
        .collect();

    if basenames.len() > 1 {
        log::warn!(
            "Image directory mixes frames of {} videos ({}); they are assembled in natural file-name order only",
            basenames.len(),
            basenames.into_iter().collect::<Vec<_>>().join(", "),
        );
    }
}
