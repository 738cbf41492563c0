//! Pipeline configuration.
//!
//! [`PipelineOptions`] is a builder that threads the sampling policy, output
//! locations, progress callback and re-encoding settings through the batch
//! driver without polluting every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use facereel::{AssemblerOptions, PipelineOptions, VideoCodec};
//!
//! let options = PipelineOptions::new()
//!     .with_sample_interval(5)
//!     .with_fps_display_interval(Duration::from_secs(2))
//!     .with_image_dir("frames")
//!     .with_assembler(AssemblerOptions::default().fps(30).codec(VideoCodec::Mpeg4));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::assemble::AssemblerOptions;
use crate::error::AnnotateError;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Run recognition on every third frame.
pub const DEFAULT_SAMPLE_INTERVAL: u64 = 3;
/// Recompute the displayed frame rate every five seconds.
pub const DEFAULT_FPS_DISPLAY_INTERVAL: Duration = Duration::from_secs(5);
/// Directory the annotated frames are written to.
pub const DEFAULT_IMAGE_DIR: &str = "treated_dir";
/// Video container extensions accepted as input.
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["mp4", "avi", "flv"];

/// Convert a display interval given in seconds, as on the command line.
///
/// # Errors
///
/// Returns [`AnnotateError::InvalidInterval`] for zero, negative, non-finite
/// values and values too large for a [`Duration`].
pub fn display_interval_from_secs(seconds: f64) -> Result<Duration, AnnotateError> {
    Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|interval| !interval.is_zero())
        .ok_or(AnnotateError::InvalidInterval)
}

/// Configuration for a batch run.
///
/// All fields have defaults matching the stock command line behaviour.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Stride, in frames, between recognition calls.
    pub(crate) sample_interval: u64,
    /// How long the frame-rate estimate is held before being recomputed.
    pub(crate) fps_display_interval: Duration,
    /// Shared directory receiving `{basename}_{index}.png` files.
    pub(crate) image_dir: PathBuf,
    /// Lower-case extensions (without the dot) accepted as input videos.
    pub(crate) extensions: Vec<String>,
    /// Font used for labels and the frame-rate text. `None` searches the
    /// usual system locations.
    pub(crate) font_path: Option<PathBuf>,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Settings for the final re-encoding pass.
    pub(crate) assembler: AssemblerOptions,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("sample_interval", &self.sample_interval)
            .field("fps_display_interval", &self.fps_display_interval)
            .field("image_dir", &self.image_dir)
            .field("extensions", &self.extensions)
            .field("font_path", &self.font_path)
            .field("assembler", &self.assembler)
            .finish_non_exhaustive()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            fps_display_interval: DEFAULT_FPS_DISPLAY_INTERVAL,
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            font_path: None,
            progress: Arc::new(NoOpProgress),
            assembler: AssemblerOptions::default(),
        }
    }

    /// Set the recognition stride. Zero is rejected when the run starts.
    #[must_use]
    pub fn with_sample_interval(mut self, interval: u64) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Set how long the frame-rate figure is held between recomputes.
    #[must_use]
    pub fn with_fps_display_interval(mut self, interval: Duration) -> Self {
        self.fps_display_interval = interval;
        self
    }

    /// Set the directory annotated frames are written to.
    #[must_use]
    pub fn with_image_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.image_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Replace the accepted input extensions. Leading dots are stripped and
    /// matching is case-insensitive.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Use the TrueType/OpenType font at `path` for overlay text.
    #[must_use]
    pub fn with_font<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.font_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set the re-encoding options.
    #[must_use]
    pub fn with_assembler(mut self, assembler: AssemblerOptions) -> Self {
        self.assembler = assembler;
        self
    }

    /// The recognition stride.
    pub fn sample_interval(&self) -> u64 {
        self.sample_interval
    }

    /// The frame-rate display interval.
    pub fn fps_display_interval(&self) -> Duration {
        self.fps_display_interval
    }

    /// The annotated image directory.
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// The accepted input extensions.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// The re-encoding options.
    pub fn assembler(&self) -> &AssemblerOptions {
        &self.assembler
    }
}
