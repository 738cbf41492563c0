//! Benchmarks for the per-frame annotation path.
//!
//! Run with: cargo bench
//!
//! Frames are synthetic, so no fixtures are needed. The assembly benchmark
//! is skipped when the local FFmpeg build has no MPEG-4 encoder.

use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion};
use facereel::natural::sort_paths;
use facereel::{
    AssemblerOptions, BoundingBox, Detection, FfmpegLogLevel, FpsEstimator, Frame,
    NullRecognizer, OverlayRenderer, SampledRecognizer, VideoAssembler, VideoCodec, write_frame,
};
use image::Rgb;

fn sample_frame(width: u32, height: u32) -> Frame {
    Frame::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 96]))
}

fn sample_detections(count: usize) -> Vec<Detection> {
    (0..count)
        .map(|i| {
            let offset = 40.0 + i as f32 * 90.0;
            Detection::labelled(
                BoundingBox::new(offset, 60.0, offset + 80.0, 160.0),
                format!("PERSON {i}"),
            )
        })
        .collect()
}

fn benchmark_overlay(criterion: &mut Criterion) {
    let frame = sample_frame(1280, 720);
    let mut group = criterion.benchmark_group("overlay render 720p");

    for (name, renderer) in [
        ("bitmap", OverlayRenderer::bitmap()),
        ("system", OverlayRenderer::new()),
    ] {
        for faces in [0usize, 1, 8] {
            let detections = sample_detections(faces);
            group.bench_with_input(BenchmarkId::new(name, faces), &detections, |bencher, d| {
                bencher.iter(|| renderer.render(&frame, d, 25));
            });
        }
    }

    group.finish();
}

fn benchmark_sampling(criterion: &mut Criterion) {
    let frame = sample_frame(64, 64);

    criterion.bench_function("sampled recognizer 300 frames (interval 3)", |bencher| {
        bencher.iter(|| {
            let mut engine = NullRecognizer;
            let mut sampler = SampledRecognizer::new(&mut engine, 3).unwrap();
            for _ in 0..300 {
                sampler.process(&frame).unwrap();
            }
        });
    });

    criterion.bench_function("fps estimator 1000 ticks", |bencher| {
        bencher.iter(|| {
            let start = Instant::now();
            let mut fps = FpsEstimator::start_at(Duration::from_secs(5), start).unwrap();
            for i in 0..1000u64 {
                fps.tick_at(start + Duration::from_millis(i * 40));
            }
        });
    });
}

fn benchmark_png_write(criterion: &mut Criterion) {
    let frame = sample_frame(1280, 720);
    let directory = tempfile::tempdir().unwrap();
    let mut index = 0u64;

    criterion.bench_function("write 720p PNG frame", |bencher| {
        bencher.iter(|| {
            write_frame(&frame, directory.path(), "bench", index).unwrap();
            index += 1;
        });
    });
}

fn benchmark_natural_sort(criterion: &mut Criterion) {
    let paths: Vec<_> = (0..5000)
        .rev()
        .map(|i| std::path::PathBuf::from(format!("treated_dir/clip_{i}.png")))
        .collect();

    criterion.bench_function("natural sort 5000 frame names", |bencher| {
        bencher.iter(|| {
            let mut paths = paths.clone();
            sort_paths(&mut paths);
        });
    });
}

fn benchmark_assembly(criterion: &mut Criterion) {
    facereel::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    let frames = tempfile::tempdir().unwrap();
    let frame = sample_frame(320, 240);
    for index in 0..25 {
        write_frame(&frame, frames.path(), "bench", index).unwrap();
    }
    let output = tempfile::tempdir().unwrap();
    let options = AssemblerOptions::default()
        .codec(VideoCodec::Mpeg4)
        .output(output.path().join("bench.mp4"));

    if let Err(error) = VideoAssembler::new(options.clone()).build(frames.path()) {
        eprintln!("Skipping benchmark: {error}");
        return;
    }

    let mut group = criterion.benchmark_group("assembly");
    group.sample_size(10);
    group.bench_function("assemble 25 frames 320x240", |bencher| {
        bencher.iter(|| VideoAssembler::new(options.clone()).build(frames.path()).unwrap());
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_overlay,
    benchmark_sampling,
    benchmark_png_write,
    benchmark_natural_sort,
    benchmark_assembly,
);
criterion::criterion_main!(benches);
