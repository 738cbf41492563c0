//! Recognition engine seam and temporal decimation.
//!
//! The face detector/recogniser itself lives outside this crate and is
//! reached through the [`Recognizer`] trait. [`SampledRecognizer`] wraps a
//! borrowed engine for the duration of one video and only consults it on
//! every `sample_interval`-th frame, handing back the previous result for the
//! frames in between.

use std::sync::Arc;

use crate::error::{AnnotateError, RecognitionError};
use crate::Frame;

/// Axis-aligned box in pixel coordinates of the frame it was detected in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// One located face, optionally identified.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    /// Identity the engine matched the face to, if any.
    pub identity_label: Option<String>,
}

impl Detection {
    /// A detection without an identity.
    pub fn new(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            identity_label: None,
        }
    }

    /// A detection identified as `label`.
    pub fn labelled(bounding_box: BoundingBox, label: impl Into<String>) -> Self {
        Self {
            bounding_box,
            identity_label: Some(label.into()),
        }
    }
}

/// A face detection/recognition engine.
///
/// Engines are loaded once per process and may be stateful; the pipeline
/// borrows one mutably for each video in turn and never calls it from more
/// than one place at a time.
pub trait Recognizer {
    /// Locate and identify the faces in `frame`.
    fn identify(&mut self, frame: &Frame) -> Result<Vec<Detection>, RecognitionError>;

    /// Toggle the engine's own diagnostic output. Ignored by default.
    fn set_debug(&mut self, _enabled: bool) {}
}

impl<R: Recognizer + ?Sized> Recognizer for &mut R {
    fn identify(&mut self, frame: &Frame) -> Result<Vec<Detection>, RecognitionError> {
        (**self).identify(frame)
    }

    fn set_debug(&mut self, enabled: bool) {
        (**self).set_debug(enabled)
    }
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn identify(&mut self, frame: &Frame) -> Result<Vec<Detection>, RecognitionError> {
        (**self).identify(frame)
    }

    fn set_debug(&mut self, enabled: bool) {
        (**self).set_debug(enabled)
    }
}

/// An engine that never finds anything.
///
/// Useful for exercising the pipeline (frame-rate overlay, image sequence,
/// re-encoding) without a model.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecognizer;

impl Recognizer for NullRecognizer {
    fn identify(&mut self, _frame: &Frame) -> Result<Vec<Detection>, RecognitionError> {
        Ok(Vec::new())
    }
}

/// Per-video sampling state around a borrowed engine.
///
/// Recognition runs when `frame_index % sample_interval == 0`; every other
/// frame gets the cached result of the last run. The cache is shared as an
/// `Arc`, so held-over frames receive the very same allocation.
pub struct SampledRecognizer<'e> {
    engine: &'e mut dyn Recognizer,
    frame_index: u64,
    sample_interval: u64,
    last_detections: Arc<[Detection]>,
    recognition_calls: u64,
}

impl<'e> SampledRecognizer<'e> {
    /// Wrap `engine`, sampling every `sample_interval` frames.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotateError::InvalidInterval`] if `sample_interval` is 0.
    pub fn new(engine: &'e mut dyn Recognizer, sample_interval: u64) -> Result<Self, AnnotateError> {
        if sample_interval == 0 {
            return Err(AnnotateError::InvalidInterval);
        }
        Ok(Self {
            engine,
            frame_index: 0,
            sample_interval,
            last_detections: Arc::from(Vec::new()),
            recognition_calls: 0,
        })
    }

    /// Detections for the next frame of the video.
    ///
    /// The frame index advances on every call, including calls where the
    /// engine fails.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotateError::Recognition`] when the engine fails. The
    /// cached detections are left as they were.
    pub fn process(&mut self, frame: &Frame) -> Result<Arc<[Detection]>, AnnotateError> {
        let index = self.frame_index;
        self.frame_index += 1;

        if index % self.sample_interval == 0 {
            self.recognition_calls += 1;
            let detections = self
                .engine
                .identify(frame)
                .map_err(AnnotateError::Recognition)?;
            log::trace!("Frame {index}: {} detection(s)", detections.len());
            self.last_detections = Arc::from(detections);
        }

        Ok(Arc::clone(&self.last_detections))
    }

    /// Index the next call to [`process`](Self::process) will use.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn sample_interval(&self) -> u64 {
        self.sample_interval
    }

    /// The cached result of the most recent successful recognition.
    pub fn last_detections(&self) -> &Arc<[Detection]> {
        &self.last_detections
    }

    /// How many times the engine has been invoked.
    pub fn recognition_calls(&self) -> u64 {
        self.recognition_calls
    }
}
