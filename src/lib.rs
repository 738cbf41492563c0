//! # facereel
//!
//! Annotate videos with face recognition results and reassemble them into a
//! single playable video.
//!
//! `facereel` decodes each input video with FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), consults a
//! recognition engine on every few frames, draws boxes, identity labels and
//! a running frame-rate figure on every frame, writes the annotated frames as
//! a numbered PNG sequence, and finally re-encodes that sequence into one
//! video together with an HTML `<video>` snippet embedding it.
//!
//! The recognition engine itself is not part of this crate. Plug one in by
//! implementing [`Recognizer`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use facereel::{BatchDriver, Detection, Frame, PipelineOptions, Recognizer};
//!
//! struct MyEngine;
//!
//! impl Recognizer for MyEngine {
//!     fn identify(
//!         &mut self,
//!         frame: &Frame,
//!     ) -> Result<Vec<Detection>, facereel::RecognitionError> {
//!         // Run a model on `frame` here.
//!         Ok(Vec::new())
//!     }
//! }
//!
//! let mut engine = MyEngine;
//! let mut driver = BatchDriver::new(PipelineOptions::new());
//! let summary = driver.run("videos/", &mut engine)?;
//! if let Some(video) = &summary.output_video {
//!     println!("annotated video: {}", video.display());
//! }
//! # Ok::<(), facereel::AnnotateError>(())
//! ```
//!
//! ## Pipeline
//!
//! - **Sampling**: recognition runs on frames whose index is a multiple of
//!   the sample interval (default 3); the frames in between reuse the last
//!   result.
//! - **Frame rate**: an integer fps figure, recomputed once per display
//!   interval (default 5 s) from wall-clock time.
//! - **Frame sequence**: `{basename}_{index}.png` in the image directory
//!   (default `treated_dir`).
//! - **Assembly**: the image directory in natural order, re-encoded at a
//!   fixed frame rate (default 25 fps) into `final_out.mp4`.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod assemble;
pub mod embed;
pub mod error;
pub mod ffmpeg;
pub mod fps;
pub mod frame_source;
pub mod jobs;
pub mod natural;
pub mod options;
pub mod overlay;
pub mod pipeline;
pub mod progress;
pub mod recognition;
pub mod sink;

/// A decoded video frame: packed 8-bit RGB.
pub type Frame = image::RgbImage;

pub use assemble::{AssemblerOptions, VideoAssembler, VideoCodec};
pub use error::{AnnotateError, RecognitionError};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use fps::FpsEstimator;
pub use frame_source::{FrameSource, VideoInfo};
pub use jobs::{Job, JobPlan, SkipReason, SkippedInput, resolve_jobs};
pub use natural::natural_cmp;
pub use options::PipelineOptions;
pub use overlay::OverlayRenderer;
pub use pipeline::{
    BatchDriver, BatchState, BatchSummary, JobFailure, JobReport, VideoSession, annotate_video,
};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use recognition::{BoundingBox, Detection, NullRecognizer, Recognizer, SampledRecognizer};
pub use sink::{FrameSink, frame_file_name, write_frame};
