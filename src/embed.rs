//! Embeddable playback markup for the assembled video.
//!
//! Both helpers only read the finished file; nothing is written.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use crate::error::AnnotateError;

/// Width, in CSS pixels, of the generated `<video>` element.
pub const DEFAULT_PLAYER_WIDTH: u32 = 450;

/// MIME type for a video path, judged by its extension.
pub fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "flv" => "video/x-flv",
        "mov" => "video/quicktime",
        _ => "video/mp4",
    }
}

/// Encode `bytes` as a `data:` URI of the given MIME type.
pub fn data_uri_from_bytes(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Read the video at `path` into a base64 `data:` URI.
pub fn data_uri(path: &Path) -> Result<String, AnnotateError> {
    let bytes = std::fs::read(path)?;
    Ok(data_uri_from_bytes(&bytes, mime_type(path)))
}

/// An HTML `<video>` element playing the video at `path` inline.
pub fn html_snippet(path: &Path, width: u32) -> Result<String, AnnotateError> {
    let uri = data_uri(path)?;
    Ok(format!(
        "<video width={width} controls>\n      <source src=\"{uri}\" type=\"{}\">\n</video>\n",
        mime_type(path)
    ))
}
