//! Turning the command-line input into a list of per-video jobs.
//!
//! [`resolve_jobs`] accepts either a single video or a directory of videos.
//! Directories are scanned one level deep; anything that is not a regular
//! file with an accepted extension is reported as a [`SkippedInput`] rather
//! than failing the run.

use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use crate::error::AnnotateError;
use crate::natural;

/// One input video and where its annotated frames go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The video to annotate.
    pub source_path: PathBuf,
    /// Directory receiving `{basename}_{index}.png` files.
    pub output_image_dir: PathBuf,
    /// Prefix of the frame files: the file name up to its first `.`.
    pub basename: String,
}

impl Job {
    pub fn new(source_path: PathBuf, output_image_dir: PathBuf) -> Self {
        let basename = video_basename(&source_path);
        Self {
            source_path,
            output_image_dir,
            basename,
        }
    }
}

/// Why an input path did not become a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The extension is not one of the accepted video extensions.
    UnsupportedExtension(String),
    /// Subdirectories are not descended into.
    Directory,
    /// Neither a regular file nor a directory (socket, dangling link, ...).
    NotAFile,
    /// An earlier input already writes frames under this basename.
    DuplicateBasename(String),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SkipReason::UnsupportedExtension(ext) if ext.is_empty() => {
                write!(f, "no file extension")
            }
            SkipReason::UnsupportedExtension(ext) => write!(f, "unsupported extension .{ext}"),
            SkipReason::Directory => write!(f, "subdirectory (not scanned)"),
            SkipReason::NotAFile => write!(f, "not a regular file"),
            SkipReason::DuplicateBasename(basename) => {
                write!(f, "frame prefix {basename:?} is already used by another input")
            }
        }
    }
}

/// An input path that was left out, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedInput {
    pub path: PathBuf,
    pub reason: SkipReason,
}

impl SkippedInput {
    /// The skip as an error value, for callers that report it as one.
    pub fn to_error(&self) -> Option<AnnotateError> {
        match &self.reason {
            SkipReason::UnsupportedExtension(extension) => Some(AnnotateError::UnsupportedFormat {
                path: self.path.clone(),
                extension: extension.clone(),
            }),
            SkipReason::Directory
            | SkipReason::NotAFile
            | SkipReason::DuplicateBasename(_) => None,
        }
    }
}

/// Validated jobs plus everything that was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPlan {
    /// Jobs in natural order of their file names.
    pub jobs: Vec<Job>,
    pub skipped: Vec<SkippedInput>,
}

/// Resolve `input` (a video or a directory of videos) into jobs writing to
/// `image_dir`.
///
/// `extensions` are compared case-insensitively and without a leading dot.
/// Every job writes under its own basename: when two inputs share one
/// (`clip.mp4` and `clip.avi`), the first in natural order is kept and the
/// others are skipped.
///
/// # Errors
///
/// Returns [`AnnotateError::InputNotFound`] when `input` does not exist and
/// [`AnnotateError::Io`] when a directory cannot be read.
pub fn resolve_jobs(
    input: &Path,
    image_dir: &Path,
    extensions: &[String],
) -> Result<JobPlan, AnnotateError> {
    if !input.exists() {
        return Err(AnnotateError::InputNotFound(input.to_path_buf()));
    }

    let candidates = if input.is_dir() {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(input)? {
            paths.push(entry?.path());
        }
        natural::sort_paths(&mut paths);
        paths
    } else {
        vec![input.to_path_buf()]
    };

    let mut plan = JobPlan::default();
    let mut basenames = HashSet::new();
    for path in candidates {
        let outcome = classify(&path, extensions).and_then(|()| {
            let job = Job::new(path.clone(), image_dir.to_path_buf());
            if basenames.insert(job.basename.clone()) {
                Ok(job)
            } else {
                Err(SkipReason::DuplicateBasename(job.basename))
            }
        });
        match outcome {
            Ok(job) => plan.jobs.push(job),
            Err(reason) => {
                log::warn!("Skipping {}: {reason}", path.display());
                plan.skipped.push(SkippedInput { path, reason });
            }
        }
    }

    log::debug!(
        "Resolved {} job(s), skipped {} path(s) from {}",
        plan.jobs.len(),
        plan.skipped.len(),
        input.display()
    );
    Ok(plan)
}

fn classify(path: &Path, extensions: &[String]) -> Result<(), SkipReason> {
    if path.is_dir() {
        return Err(SkipReason::Directory);
    }
    if !path.is_file() {
        return Err(SkipReason::NotAFile);
    }

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if extensions
        .iter()
        .any(|accepted| accepted.trim_start_matches('.').eq_ignore_ascii_case(&extension))
    {
        Ok(())
    } else {
        Err(SkipReason::UnsupportedExtension(extension))
    }
}

/// File name of `path` up to its first `.` (`clip.final.mp4` → `clip`).
pub fn video_basename(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}
