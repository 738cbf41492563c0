//! Drawing detections and the frame-rate figure onto frames.
//!
//! Text is rendered with a TrueType font through `ab_glyph` when one can be
//! found. Hosts without any usable font fall back to a small built-in 5×7
//! bitmap face, so the frame-rate figure is drawn on every frame regardless.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::error::AnnotateError;
use crate::recognition::{BoundingBox, Detection};
use crate::Frame;

/// Colour of face boxes and identity labels.
pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Colour of the frame-rate text.
pub const FPS_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Top-left corner of the frame-rate text.
pub const FPS_POSITION: (i32, i32) = (10, 10);

const BOX_THICKNESS: u32 = 2;
const TEXT_SCALE: f32 = 28.0;
const BITMAP_CELL: u32 = 3;

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

enum TextFace {
    TrueType(FontVec),
    Bitmap,
}

/// Draws face boxes, identity labels and the frame-rate figure.
pub struct OverlayRenderer {
    face: TextFace,
}

impl std::fmt::Debug for OverlayRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayRenderer")
            .field("truetype", &self.has_truetype_font())
            .finish()
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRenderer {
    /// Use the first well-known system font that loads, or the built-in
    /// bitmap face when there is none.
    pub fn new() -> Self {
        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.is_file() {
                continue;
            }
            match Self::with_font_file(path) {
                Ok(renderer) => {
                    log::debug!("Overlay font: {}", path.display());
                    return renderer;
                }
                Err(error) => log::debug!("Skipping font {}: {error}", path.display()),
            }
        }
        log::debug!("No system font found, using the built-in bitmap face");
        Self::bitmap()
    }

    /// Render text with the built-in bitmap face only.
    pub fn bitmap() -> Self {
        Self {
            face: TextFace::Bitmap,
        }
    }

    /// Render text with an already loaded font.
    pub fn with_font(font: FontVec) -> Self {
        Self {
            face: TextFace::TrueType(font),
        }
    }

    /// Load the TrueType/OpenType font at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotateError::Io`] if the file cannot be read or does not
    /// hold a font (`InvalidData`).
    pub fn with_font_file<P: AsRef<Path>>(path: P) -> Result<Self, AnnotateError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let data = std::fs::read(&path)?;
        let font = FontVec::try_from_vec(data).map_err(|error| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} is not a usable font: {error}", path.display()),
            )
        })?;
        Ok(Self::with_font(font))
    }

    /// Whether a TrueType font (rather than the bitmap face) is in use.
    pub fn has_truetype_font(&self) -> bool {
        matches!(self.face, TextFace::TrueType(_))
    }

    /// Return a copy of `frame` with `detections` and `fps` drawn on it.
    ///
    /// Each detection gets a box; labelled detections also get their label
    /// at the box's bottom-left corner. The `"{fps} fps"` text is always
    /// drawn, even when there are no detections.
    pub fn render(&self, frame: &Frame, detections: &[Detection], fps: u32) -> Frame {
        let mut canvas = frame.clone();

        for detection in detections {
            let Some(rect) = clamp_to_frame(&detection.bounding_box, &canvas) else {
                continue;
            };
            draw_thick_rect(&mut canvas, rect, BOX_COLOR);

            if let Some(label) = &detection.identity_label {
                let text_height = self.text_height(label);
                let x = rect.left();
                let y = rect.bottom() + 1 - text_height as i32;
                self.draw_text(&mut canvas, BOX_COLOR, x, y, label);
            }
        }

        let (x, y) = FPS_POSITION;
        self.draw_text(&mut canvas, FPS_COLOR, x, y, &format!("{fps} fps"));
        canvas
    }

    fn text_height(&self, text: &str) -> u32 {
        match &self.face {
            TextFace::TrueType(font) => text_size(PxScale::from(TEXT_SCALE), font, text).1,
            TextFace::Bitmap => 7 * BITMAP_CELL,
        }
    }

    fn draw_text(&self, canvas: &mut Frame, color: Rgb<u8>, x: i32, y: i32, text: &str) {
        match &self.face {
            TextFace::TrueType(font) => {
                draw_text_mut(canvas, color, x, y, PxScale::from(TEXT_SCALE), font, text);
            }
            TextFace::Bitmap => draw_bitmap_text(canvas, color, x, y, text),
        }
    }
}

/// Convert a floating-point box into an in-frame rectangle, or `None` if
/// nothing of it is visible.
fn clamp_to_frame(bbox: &BoundingBox, frame: &Frame) -> Option<Rect> {
    let max_x = frame.width() as i64 - 1;
    let max_y = frame.height() as i64 - 1;
    if max_x < 0 || max_y < 0 {
        return None;
    }

    let x1 = (bbox.x1.min(bbox.x2) as i64).clamp(0, max_x);
    let x2 = (bbox.x1.max(bbox.x2) as i64).clamp(0, max_x);
    let y1 = (bbox.y1.min(bbox.y2) as i64).clamp(0, max_y);
    let y2 = (bbox.y1.max(bbox.y2) as i64).clamp(0, max_y);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(Rect::at(x1 as i32, y1 as i32).of_size((x2 - x1 + 1) as u32, (y2 - y1 + 1) as u32))
}

fn draw_thick_rect(canvas: &mut Frame, rect: Rect, color: Rgb<u8>) {
    for inset in 0..BOX_THICKNESS {
        let width = rect.width().saturating_sub(2 * inset);
        let height = rect.height().saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let inner = Rect::at(rect.left() + inset as i32, rect.top() + inset as i32)
            .of_size(width, height);
        draw_hollow_rect_mut(canvas, inner, color);
    }
}

fn draw_bitmap_text(canvas: &mut Frame, color: Rgb<u8>, x: i32, y: i32, text: &str) {
    let advance = (5 + 1) * BITMAP_CELL as i32;
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);

    for (position, ch) in text.chars().enumerate() {
        let origin_x = x + position as i32 * advance;
        for (row, bits) in bitmap_glyph(ch).iter().enumerate() {
            for column in 0..5 {
                if bits & (0x10 >> column) == 0 {
                    continue;
                }
                for dy in 0..BITMAP_CELL as i32 {
                    for dx in 0..BITMAP_CELL as i32 {
                        let px = origin_x + column * BITMAP_CELL as i32 + dx;
                        let py = y + row as i32 * BITMAP_CELL as i32 + dy;
                        if (0..width).contains(&px) && (0..height).contains(&py) {
                            canvas.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}

/// Rows of a 5×7 glyph, most significant of the low five bits leftmost.
/// Letters share one upper-case set; unknown characters draw as a box.
fn bitmap_glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        ' ' => [0x00; 7],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}
