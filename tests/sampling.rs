//! Temporal sampling integration tests.
//!
//! These tests drive [`SampledRecognizer`] with scripted engines and never
//! touch FFmpeg.

use std::sync::Arc;

use facereel::{
    AnnotateError, BoundingBox, Detection, Frame, NullRecognizer, RecognitionError, Recognizer,
    SampledRecognizer,
};

/// Engine that counts its invocations and reports one detection labelled
/// with the call number.
#[derive(Default)]
struct CountingEngine {
    calls: usize,
}

impl Recognizer for CountingEngine {
    fn identify(&mut self, _frame: &Frame) -> Result<Vec<Detection>, RecognitionError> {
        self.calls += 1;
        let label = format!("call-{}", self.calls);
        Ok(vec![Detection::labelled(
            BoundingBox::new(1.0, 1.0, 5.0, 5.0),
            label,
        )])
    }
}

/// Engine that fails on its second invocation.
#[derive(Default)]
struct FlakyEngine {
    calls: u32,
}

impl Recognizer for FlakyEngine {
    fn identify(&mut self, _frame: &Frame) -> Result<Vec<Detection>, RecognitionError> {
        self.calls += 1;
        if self.calls == 2 {
            return Err("model crashed".into());
        }
        Ok(vec![Detection::new(BoundingBox::new(0.0, 0.0, 2.0, 2.0))])
    }
}

fn blank_frame() -> Frame {
    Frame::new(8, 8)
}

#[test]
fn engine_runs_on_multiples_of_interval() {
    let mut engine = CountingEngine::default();
    let frame = blank_frame();
    {
        let mut sampler = SampledRecognizer::new(&mut engine, 3).expect("valid interval");
        for _ in 0..10 {
            sampler.process(&frame).expect("engine never fails");
        }
        assert_eq!(sampler.recognition_calls(), 4);
        assert_eq!(sampler.frame_index(), 10);
    }
    assert_eq!(engine.calls, 4);
}

#[test]
fn engine_sees_expected_frame_indices() {
    struct IndexRecorder {
        seen: Vec<u8>,
    }

    impl Recognizer for IndexRecorder {
        fn identify(&mut self, frame: &Frame) -> Result<Vec<Detection>, RecognitionError> {
            self.seen.push(frame.get_pixel(0, 0)[0]);
            Ok(Vec::new())
        }
    }

    let mut engine = IndexRecorder { seen: Vec::new() };
    {
        let mut sampler = SampledRecognizer::new(&mut engine, 3).expect("valid interval");
        for index in 0..10u8 {
            let frame = Frame::from_pixel(4, 4, image::Rgb([index, 0, 0]));
            sampler.process(&frame).expect("process");
        }
    }
    assert_eq!(engine.seen, vec![0, 3, 6, 9]);
}

#[test]
fn held_over_frames_share_the_last_result() {
    let mut engine = CountingEngine::default();
    let frame = blank_frame();
    let mut sampler = SampledRecognizer::new(&mut engine, 3).expect("valid interval");

    let sampled = sampler.process(&frame).expect("frame 0");
    let held_1 = sampler.process(&frame).expect("frame 1");
    let held_2 = sampler.process(&frame).expect("frame 2");
    let resampled = sampler.process(&frame).expect("frame 3");

    assert!(Arc::ptr_eq(&sampled, &held_1));
    assert!(Arc::ptr_eq(&sampled, &held_2));
    assert!(!Arc::ptr_eq(&sampled, &resampled));
    assert_eq!(sampled[0].identity_label.as_deref(), Some("call-1"));
    assert_eq!(resampled[0].identity_label.as_deref(), Some("call-2"));
}

#[test]
fn interval_of_one_calls_engine_every_frame() {
    let mut engine = CountingEngine::default();
    let frame = blank_frame();
    {
        let mut sampler = SampledRecognizer::new(&mut engine, 1).expect("valid interval");
        for _ in 0..5 {
            sampler.process(&frame).expect("process");
        }
    }
    assert_eq!(engine.calls, 5);
}

#[test]
fn interval_larger_than_video_calls_engine_once() {
    let mut engine = CountingEngine::default();
    let frame = blank_frame();
    let mut sampler = SampledRecognizer::new(&mut engine, 100).expect("valid interval");
    let first = sampler.process(&frame).expect("frame 0");
    for _ in 1..7 {
        let held = sampler.process(&frame).expect("held frame");
        assert!(Arc::ptr_eq(&first, &held));
    }
    assert_eq!(sampler.recognition_calls(), 1);
}

#[test]
fn zero_interval_is_rejected() {
    let mut engine = NullRecognizer;
    let result = SampledRecognizer::new(&mut engine, 0);
    assert!(matches!(result, Err(AnnotateError::InvalidInterval)));
}

#[test]
fn empty_result_is_cached_too() {
    let mut engine = NullRecognizer;
    let frame = blank_frame();
    let mut sampler = SampledRecognizer::new(&mut engine, 2).expect("valid interval");
    assert!(sampler.process(&frame).expect("frame 0").is_empty());
    assert!(sampler.process(&frame).expect("frame 1").is_empty());
    assert!(sampler.last_detections().is_empty());
}

#[test]
fn engine_failure_keeps_cache_and_advances_index() {
    let mut engine = FlakyEngine::default();
    let frame = blank_frame();
    let mut sampler = SampledRecognizer::new(&mut engine, 1).expect("valid interval");

    let first = sampler.process(&frame).expect("first call succeeds");
    let error = sampler.process(&frame).expect_err("second call fails");
    match error {
        AnnotateError::Recognition(inner) => assert_eq!(inner.to_string(), "model crashed"),
        other => panic!("Expected Recognition, got: {other}"),
    }

    assert_eq!(sampler.frame_index(), 2);
    assert!(Arc::ptr_eq(&first, sampler.last_detections()));
    assert_eq!(sampler.recognition_calls(), 2);
}

#[test]
fn boxed_engine_is_a_recognizer() {
    let mut engine: Box<dyn Recognizer> = Box::new(CountingEngine::default());
    let frame = blank_frame();
    let mut sampler = SampledRecognizer::new(&mut engine, 2).expect("valid interval");
    let detections = sampler.process(&frame).expect("process");
    assert_eq!(detections.len(), 1);
}

#[test]
fn bounding_box_dimensions() {
    let bbox = BoundingBox::new(10.0, 20.0, 40.0, 80.0);
    assert_eq!(bbox.width(), 30.0);
    assert_eq!(bbox.height(), 60.0);
}
