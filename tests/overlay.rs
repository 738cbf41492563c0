//! Overlay rendering tests.
//!
//! Most tests use the built-in bitmap face so their pixel expectations hold
//! on hosts without system fonts.

use facereel::overlay::{BOX_COLOR, FPS_COLOR, FPS_POSITION};
use facereel::{BoundingBox, Detection, Frame, OverlayRenderer};
use image::Rgb;

const BACKGROUND: Rgb<u8> = Rgb([20, 20, 20]);

fn background_frame(width: u32, height: u32) -> Frame {
    Frame::from_pixel(width, height, BACKGROUND)
}

fn count_pixels(frame: &Frame, color: Rgb<u8>) -> usize {
    frame.pixels().filter(|pixel| **pixel == color).count()
}

#[test]
fn fps_text_is_drawn_without_detections() {
    let renderer = OverlayRenderer::bitmap();
    let frame = background_frame(160, 90);
    let annotated = renderer.render(&frame, &[], 24);

    let (x, y) = FPS_POSITION;
    let near_origin = (x as u32..x as u32 + 60)
        .flat_map(|px| (y as u32..y as u32 + 21).map(move |py| (px, py)))
        .any(|(px, py)| *annotated.get_pixel(px, py) == FPS_COLOR);
    assert!(near_origin, "fps text should be drawn at the top-left");
    assert_eq!(count_pixels(&annotated, BOX_COLOR), 0);
}

#[test]
fn render_keeps_dimensions_and_source() {
    let renderer = OverlayRenderer::bitmap();
    let frame = background_frame(64, 48);
    let detections = vec![Detection::new(BoundingBox::new(5.0, 5.0, 30.0, 30.0))];
    let annotated = renderer.render(&frame, &detections, 3);

    assert_eq!(annotated.dimensions(), (64, 48));
    assert_eq!(count_pixels(&frame, BOX_COLOR), 0, "input frame is untouched");
    assert_eq!(count_pixels(&frame, FPS_COLOR), 0, "input frame is untouched");
}

#[test]
fn box_is_drawn_on_its_edges() {
    let renderer = OverlayRenderer::bitmap();
    let frame = background_frame(120, 120);
    let detections = vec![Detection::new(BoundingBox::new(40.0, 50.0, 90.0, 100.0))];
    let annotated = renderer.render(&frame, &detections, 0);

    assert_eq!(*annotated.get_pixel(40, 75), BOX_COLOR, "left edge");
    assert_eq!(*annotated.get_pixel(41, 75), BOX_COLOR, "two pixels thick");
    assert_eq!(*annotated.get_pixel(90, 75), BOX_COLOR, "right edge");
    assert_eq!(*annotated.get_pixel(65, 50), BOX_COLOR, "top edge");
    assert_eq!(*annotated.get_pixel(65, 100), BOX_COLOR, "bottom edge");
    assert_eq!(*annotated.get_pixel(65, 75), BACKGROUND, "interior untouched");
}

#[test]
fn label_is_drawn_at_bottom_left_of_box() {
    let renderer = OverlayRenderer::bitmap();
    let frame = background_frame(200, 200);
    let bbox = BoundingBox::new(60.0, 60.0, 180.0, 180.0);

    let unlabelled = renderer.render(&frame, &[Detection::new(bbox)], 0);
    let labelled = renderer.render(&frame, &[Detection::labelled(bbox, "ALICE")], 0);

    assert!(count_pixels(&labelled, BOX_COLOR) > count_pixels(&unlabelled, BOX_COLOR));

    // The label sits inside the box, just above its bottom edge.
    let label_pixels = (62..150u32)
        .flat_map(|x| (155..178u32).map(move |y| (x, y)))
        .filter(|&(x, y)| *labelled.get_pixel(x, y) == BOX_COLOR)
        .count();
    assert!(label_pixels > 0);
}

#[test]
fn box_outside_frame_is_clipped() {
    let renderer = OverlayRenderer::bitmap();
    let frame = background_frame(50, 50);
    let detections = vec![
        Detection::new(BoundingBox::new(-20.0, -20.0, 200.0, 200.0)),
        Detection::new(BoundingBox::new(500.0, 500.0, 600.0, 600.0)),
    ];
    let annotated = renderer.render(&frame, &detections, 0);

    assert_eq!(annotated.dimensions(), (50, 50));
    assert_eq!(*annotated.get_pixel(0, 25), BOX_COLOR);
    assert_eq!(*annotated.get_pixel(49, 25), BOX_COLOR);
}

#[test]
fn tiny_frame_does_not_panic() {
    let renderer = OverlayRenderer::bitmap();
    let frame = background_frame(4, 4);
    let detections = vec![Detection::labelled(
        BoundingBox::new(0.0, 0.0, 3.0, 3.0),
        "someone with a long name",
    )];
    let annotated = renderer.render(&frame, &detections, 123_456);
    assert_eq!(annotated.dimensions(), (4, 4));
}

#[test]
fn system_font_renderer_draws_fps() {
    let renderer = OverlayRenderer::new();
    let frame = background_frame(200, 100);
    let annotated = renderer.render(&frame, &[], 30);
    assert!(count_pixels(&annotated, FPS_COLOR) > 0 || renderer.has_truetype_font());
}

#[test]
fn invalid_font_file_is_rejected() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let font_path = temporary_directory.path().join("broken.ttf");
    std::fs::write(&font_path, b"not a font").expect("Failed to write font file");

    let result = OverlayRenderer::with_font_file(&font_path);
    assert!(result.is_err());
    let message = result.unwrap_err().to_string();
    assert!(message.contains("not a usable font"), "unexpected message: {message}");
}

#[test]
fn bitmap_renderer_reports_no_truetype_font() {
    assert!(!OverlayRenderer::bitmap().has_truetype_font());
}
