//! The batch annotation pipeline.
//!
//! [`BatchDriver`] resolves the input into jobs, runs every job through
//! decode → sampled recognition → frame-rate estimate → overlay → PNG
//! sequence, and finally re-encodes the shared image directory into one
//! video. A job that fails is recorded in the [`BatchSummary`] and the
//! remaining jobs still run.
//!
//! # Example
//!
//! ```no_run
//! use facereel::{BatchDriver, NullRecognizer, PipelineOptions};
//!
//! let mut engine = NullRecognizer;
//! let mut driver = BatchDriver::new(PipelineOptions::new());
//! let summary = driver.run("videos/", &mut engine)?;
//! for report in &summary.succeeded {
//!     println!("{}: {} frames", report.source.display(), report.frames);
//! }
//! # Ok::<(), facereel::AnnotateError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assemble::VideoAssembler;
use crate::embed;
use crate::error::AnnotateError;
use crate::fps::FpsEstimator;
use crate::frame_source::FrameSource;
use crate::jobs::{self, Job, SkippedInput};
use crate::options::PipelineOptions;
use crate::overlay::OverlayRenderer;
use crate::progress::{OperationType, ProgressTracker};
use crate::recognition::{Recognizer, SampledRecognizer};
use crate::sink::FrameSink;
use crate::Frame;

/// Outcome of one successfully annotated video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub source: PathBuf,
    pub basename: String,
    /// Annotated frames written to the image directory.
    pub frames: u64,
    /// How often the recognition engine was consulted.
    pub recognition_calls: u64,
}

/// A video whose annotation stopped with an error.
#[derive(Debug)]
pub struct JobFailure {
    pub source: PathBuf,
    pub error: AnnotateError,
    /// Frames that had been written when the job failed. They are removed
    /// from the image directory again before assembly.
    pub frames_written: u64,
}

/// Everything a batch run produced.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<JobReport>,
    pub failed: Vec<JobFailure>,
    pub skipped: Vec<SkippedInput>,
    /// The assembled video, when assembly ran and succeeded.
    pub output_video: Option<PathBuf>,
    /// `<video>` markup embedding [`output_video`](Self::output_video).
    pub html: Option<String>,
    /// Why no video was produced, if none was.
    pub assembly_error: Option<AnnotateError>,
}

impl BatchSummary {
    /// `true` when the output video was produced.
    pub fn is_success(&self) -> bool {
        self.output_video.is_some() && self.assembly_error.is_none()
    }
}

/// Where a [`BatchDriver`] is in its run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    ResolvingInput,
    /// Annotating the job with this index.
    ProcessingVideo(usize),
    Assembling,
    Done,
    Failed(String),
}

/// Per-video state: sampling cache, frame-rate estimate and frame numbering.
///
/// A fresh session is created for every job so nothing leaks from one video
/// into the next; only the engine is shared, by mutable borrow.
pub struct VideoSession<'e, 'r> {
    source: PathBuf,
    recognizer: SampledRecognizer<'e>,
    fps: FpsEstimator,
    renderer: &'r OverlayRenderer,
    sink: FrameSink,
}

impl<'e, 'r> VideoSession<'e, 'r> {
    /// Start a session for `job`.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotateError::InvalidInterval`] for a zero sample or
    /// display interval.
    pub fn new(
        job: &Job,
        engine: &'e mut dyn Recognizer,
        options: &PipelineOptions,
        renderer: &'r OverlayRenderer,
    ) -> Result<Self, AnnotateError> {
        Ok(Self {
            source: job.source_path.clone(),
            recognizer: SampledRecognizer::new(engine, options.sample_interval)?,
            fps: FpsEstimator::new(options.fps_display_interval)?,
            renderer,
            sink: FrameSink::new(&job.output_image_dir, job.basename.clone()),
        })
    }

    /// Recognise (or reuse), annotate and write one frame.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<PathBuf, AnnotateError> {
        let detections = self.recognizer.process(frame)?;
        let fps = self.fps.tick();
        let annotated = self.renderer.render(frame, &detections, fps);
        self.sink.write(&annotated)
    }

    /// Annotate every frame of `frames`, stopping at the first error.
    pub fn run<I>(mut self, frames: I) -> Result<JobReport, AnnotateError>
    where
        I: IntoIterator<Item = Result<Frame, AnnotateError>>,
    {
        self.run_tracked(frames, None)
    }

    pub fn frames_written(&self) -> u64 {
        self.sink.written()
    }

    pub fn recognition_calls(&self) -> u64 {
        self.recognizer.recognition_calls()
    }

    /// Remove the frames written so far, leaving no partial sequence behind.
    pub fn discard_frames(&mut self) -> Result<u64, AnnotateError> {
        self.sink.discard()
    }

    fn run_tracked<I>(
        &mut self,
        frames: I,
        mut tracker: Option<&mut ProgressTracker>,
    ) -> Result<JobReport, AnnotateError>
    where
        I: IntoIterator<Item = Result<Frame, AnnotateError>>,
    {
        for frame in frames {
            self.process_frame(&frame?)?;
            if let Some(tracker) = tracker.as_deref_mut() {
                tracker.advance();
            }
        }
        if let Some(tracker) = tracker {
            tracker.finish();
        }
        Ok(self.report())
    }

    fn report(&self) -> JobReport {
        JobReport {
            source: self.source.clone(),
            basename: self.sink.basename().to_string(),
            frames: self.sink.written(),
            recognition_calls: self.recognizer.recognition_calls(),
        }
    }
}

/// Decode, annotate and write every frame of `job`'s video.
///
/// The decoder is released before this returns, whether or not the job
/// succeeded. A job that fails part way has its frames removed again so the
/// assembled video only holds videos that were annotated completely;
/// [`JobFailure::frames_written`] still counts them.
pub fn annotate_video(
    job: &Job,
    engine: &mut dyn Recognizer,
    options: &PipelineOptions,
    renderer: &OverlayRenderer,
) -> Result<JobReport, JobFailure> {
    let failure = |error, frames_written| JobFailure {
        source: job.source_path.clone(),
        error,
        frames_written,
    };

    let source = FrameSource::open(&job.source_path).map_err(|error| failure(error, 0))?;
    let info = source.metadata();
    let mut session =
        VideoSession::new(job, engine, options, renderer).map_err(|error| failure(error, 0))?;
    let mut tracker = ProgressTracker::new(
        Arc::clone(&options.progress),
        OperationType::Annotation,
        Some(info.frame_count),
        Some(job.source_path.clone()),
    );

    let result = session.run_tracked(source, Some(&mut tracker));
    let written = session.frames_written();
    result.map_err(|error| {
        match session.discard_frames() {
            Ok(removed) => log::debug!(
                "Removed {removed} partial frame(s) of {}",
                job.source_path.display()
            ),
            Err(cleanup) => log::warn!(
                "Cannot remove partial frames of {}: {cleanup}",
                job.source_path.display()
            ),
        }
        failure(error, written)
    })
}

/// Runs a whole batch: resolve, annotate each job, assemble.
pub struct BatchDriver {
    options: PipelineOptions,
    renderer: OverlayRenderer,
    state: BatchState,
}

impl BatchDriver {
    /// Create a driver. The overlay font comes from
    /// [`PipelineOptions::with_font`] or, failing that, the system.
    pub fn new(options: PipelineOptions) -> Self {
        let renderer = match &options.font_path {
            Some(path) => OverlayRenderer::with_font_file(path).unwrap_or_else(|error| {
                log::warn!("Cannot use font {}: {error}", path.display());
                OverlayRenderer::new()
            }),
            None => OverlayRenderer::new(),
        };
        Self::with_renderer(options, renderer)
    }

    /// Create a driver drawing with `renderer`.
    pub fn with_renderer(options: PipelineOptions, renderer: OverlayRenderer) -> Self {
        Self {
            options,
            renderer,
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Annotate every video under `input` with `engine`, then assemble the
    /// image directory into the output video.
    ///
    /// Per-job errors and assembly errors end up in the returned summary.
    ///
    /// # Errors
    ///
    /// Fails before any video is touched when the options are invalid, the
    /// input does not exist, or the image directory cannot be created.
    pub fn run<P: AsRef<Path>>(
        &mut self,
        input: P,
        engine: &mut dyn Recognizer,
    ) -> Result<BatchSummary, AnnotateError> {
        let input = input.as_ref();

        if let Err(error) = self.validate() {
            self.state = BatchState::Failed(error.to_string());
            return Err(error);
        }

        self.state = BatchState::ResolvingInput;
        let plan = match jobs::resolve_jobs(input, &self.options.image_dir, &self.options.extensions)
            .and_then(|plan| {
                std::fs::create_dir_all(&self.options.image_dir)?;
                Ok(plan)
            }) {
            Ok(plan) => plan,
            Err(error) => {
                self.state = BatchState::Failed(error.to_string());
                return Err(error);
            }
        };

        let mut summary = BatchSummary {
            skipped: plan.skipped,
            ..BatchSummary::default()
        };

        for (index, job) in plan.jobs.iter().enumerate() {
            self.state = BatchState::ProcessingVideo(index);
            log::info!("Annotating {}", job.source_path.display());

            match annotate_video(job, engine, &self.options, &self.renderer) {
                Ok(report) => {
                    log::info!(
                        "Finished {} ({} frames, {} recognition calls)",
                        job.source_path.display(),
                        report.frames,
                        report.recognition_calls
                    );
                    summary.succeeded.push(report);
                }
                Err(failure) => {
                    log::warn!(
                        "Failed {} after {} frame(s): {}",
                        job.source_path.display(),
                        failure.frames_written,
                        failure.error
                    );
                    summary.failed.push(failure);
                }
            }
        }

        if summary.succeeded.is_empty() {
            let error = AnnotateError::NoSuccessfulJobs;
            self.state = BatchState::Failed(error.to_string());
            summary.assembly_error = Some(error);
            return Ok(summary);
        }

        self.state = BatchState::Assembling;
        let assembler = VideoAssembler::new(self.options.assembler.clone())
            .with_progress(Arc::clone(&self.options.progress));
        let assembled = assembler.build(&self.options.image_dir).and_then(|video| {
            let html = embed::html_snippet(&video, embed::DEFAULT_PLAYER_WIDTH)?;
            Ok((video, html))
        });

        match assembled {
            Ok((video, html)) => {
                summary.output_video = Some(video);
                summary.html = Some(html);
                self.state = BatchState::Done;
            }
            Err(error) => {
                log::warn!("Assembly failed: {error}");
                self.state = BatchState::Failed(error.to_string());
                summary.assembly_error = Some(error);
            }
        }

        Ok(summary)
    }

    fn validate(&self) -> Result<(), AnnotateError> {
        if self.options.sample_interval == 0
            || self.options.fps_display_interval.is_zero()
            || self.options.assembler.fps == 0
            || i32::try_from(self.options.assembler.fps).is_err()
        {
            return Err(AnnotateError::InvalidInterval);
        }
        Ok(())
    }
}
