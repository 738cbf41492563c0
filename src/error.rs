//! Error types for the `facereel` crate.
//!
//! This module defines [`AnnotateError`], the unified error type returned by
//! all fallible operations in the crate, and [`RecognitionError`], the boxed
//! error a [`Recognizer`](crate::Recognizer) implementation reports.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// Error reported by a recognition engine.
///
/// Engines live outside this crate, so their failures are carried as an
/// opaque boxed error.
pub type RecognitionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The unified error type for all `facereel` operations.
///
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnnotateError {
    /// The video container could not be opened or decoded.
    #[error("Unreadable video {path}: {reason}")]
    UnreadableVideo {
        /// Path of the offending video.
        path: PathBuf,
        /// Underlying reason the open or decode failed.
        reason: String,
    },

    /// The file extension is not one of the accepted video formats.
    #[error("Wrong format for {path}: {extension:?} is not an accepted video extension")]
    UnsupportedFormat {
        /// Path of the skipped file.
        path: PathBuf,
        /// The file's extension, empty when it has none.
        extension: String,
    },

    /// The input path passed to the batch driver does not exist.
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    /// The recognition engine failed on a frame.
    #[error("Recognition engine error: {0}")]
    Recognition(RecognitionError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate while encoding an annotated frame.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// Re-encoding the annotated frames into the output video failed.
    #[error("Video encoding error: {0}")]
    Encode(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// A sampling interval, display interval or frame rate of zero was provided.
    #[error("Interval must be greater than zero")]
    InvalidInterval,

    /// No video was annotated successfully, so there is nothing to assemble.
    #[error("No video was annotated successfully; nothing to assemble")]
    NoSuccessfulJobs,
}

impl From<FfmpegError> for AnnotateError {
    fn from(error: FfmpegError) -> Self {
        AnnotateError::Ffmpeg(error.to_string())
    }
}

impl AnnotateError {
    /// Build an [`AnnotateError::UnreadableVideo`] for `path`.
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AnnotateError::UnreadableVideo {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
