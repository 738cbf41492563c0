//! Persisting annotated frames as a numbered PNG sequence.

use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::error::AnnotateError;
use crate::Frame;

/// File name of frame `index` of the video called `basename`.
pub fn frame_file_name(basename: &str, index: u64) -> String {
    format!("{basename}_{index}.png")
}

/// Write `frame` as `{output_dir}/{basename}_{index}.png`.
///
/// The directory must already exist.
///
/// # Errors
///
/// Returns [`AnnotateError::Io`] or [`AnnotateError::Image`] when the file
/// cannot be created or encoded.
pub fn write_frame(
    frame: &Frame,
    output_dir: &Path,
    basename: &str,
    index: u64,
) -> Result<PathBuf, AnnotateError> {
    let path = output_dir.join(frame_file_name(basename, index));
    frame.save_with_format(&path, ImageFormat::Png)?;
    Ok(path)
}

/// Numbers and writes the annotated frames of one video.
///
/// Indices start at 0 and only advance when a write succeeds, so the
/// sequence on disk has no gaps.
#[derive(Debug, Clone)]
pub struct FrameSink {
    output_dir: PathBuf,
    basename: String,
    next_index: u64,
}

impl FrameSink {
    pub fn new<P: AsRef<Path>>(output_dir: P, basename: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            basename: basename.into(),
            next_index: 0,
        }
    }

    /// Write the next frame of the sequence and return its path.
    pub fn write(&mut self, frame: &Frame) -> Result<PathBuf, AnnotateError> {
        let path = write_frame(frame, &self.output_dir, &self.basename, self.next_index)?;
        self.next_index += 1;
        Ok(path)
    }

    /// Delete every frame this sink has written and restart numbering at 0.
    ///
    /// Files that are already gone are not an error. Returns how many files
    /// were removed.
    pub fn discard(&mut self) -> Result<u64, AnnotateError> {
        let mut removed = 0;
        for index in 0..self.next_index {
            let path = self.output_dir.join(frame_file_name(&self.basename, index));
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => return Err(error.into()),
            }
        }
        self.next_index = 0;
        Ok(removed)
    }

    /// Number of frames written so far.
    pub fn written(&self) -> u64 {
        self.next_index
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
