//! Progress reporting.
//!
//! [`ProgressCallback`] receives [`ProgressInfo`] snapshots while videos are
//! being annotated and while the annotated frames are re-encoded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use facereel::{BatchDriver, NullRecognizer, PipelineOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = PipelineOptions::new().with_progress(Arc::new(PrintProgress));
//! let mut engine = NullRecognizer;
//! let summary = BatchDriver::new(options).run("videos/", &mut engine)?;
//! # Ok::<(), facereel::AnnotateError>(())
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The kind of work currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding, recognising, annotating and writing the frames of one video.
    Annotation,
    /// Re-encoding the annotated image sequence into the output video.
    Assembly,
}

/// A snapshot of pipeline progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many frames have been processed so far.
    pub current: u64,
    /// Total frames expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The video being annotated or the image being encoded.
    pub current_file: Option<PathBuf>,
}

/// Trait for receiving progress updates.
///
/// Callbacks are **infallible**: they observe but cannot halt the pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called once per processed frame and once when an operation finishes.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. This is the default.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks progress timing for one operation and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    start_time: Instant,
    current_file: Option<PathBuf>,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        current_file: Option<PathBuf>,
    ) -> Self {
        Self {
            callback,
            operation,
            // A zero estimate means the container did not report a length.
            total: total.filter(|&t| t > 0),
            current: 0,
            start_time: Instant::now(),
            current_file,
        }
    }

    /// Record one completed frame and fire the callback.
    pub(crate) fn advance(&mut self) {
        self.current += 1;
        self.report();
    }

    /// Emit a final report with the total pinned to the processed count.
    pub(crate) fn finish(&mut self) {
        self.total = Some(self.current);
        self.report();
    }

    fn report(&self) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| ((self.current as f32 / t as f32) * 100.0).min(100.0));

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                let per_item = elapsed / self.current as u32;
                per_item * remaining as u32
            })
        } else {
            None
        };

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_file: self.current_file.clone(),
        };

        self.callback.on_progress(&info);
    }
}
