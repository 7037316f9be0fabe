//! Spectrum pipeline benchmarks
//!
//! Measures the capture callback's frame intake path.

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use devscope_core::{AnalyzerConfig, CaptureFrame, SpectrumPipeline};

fn benchmark_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_submit");

    for frame_size in [1024, 4096, 8192] {
        let config = AnalyzerConfig {
            frame_size,
            min_publish_interval_ms: 0,
            ..AnalyzerConfig::default()
        };
        let (mut pipeline, _receiver) = SpectrumPipeline::new(&config, 48000.0).unwrap();

        // Stereo interleaved capture buffer
        let capture: Vec<f32> = (0..frame_size * 2)
            .map(|i| (i as f32 * 0.001).sin())
            .collect();

        group.throughput(Throughput::Elements(frame_size as u64));
        group.bench_function(format!("publish_{}_samples", frame_size), |b| {
            b.iter(|| {
                pipeline.submit(CaptureFrame::interleaved(black_box(&capture), 2));
            })
        });
    }

    group.finish();
}

fn benchmark_throttled(c: &mut Criterion) {
    let (mut pipeline, _receiver) =
        SpectrumPipeline::new(&AnalyzerConfig::default(), 48000.0).unwrap();
    let capture = vec![0.25_f32; 512];
    let start = Instant::now();
    pipeline.submit_at(CaptureFrame::mono(&capture), start);

    // Every candidate lands inside the interval and is dropped
    c.bench_function("dropped_frame", |b| {
        b.iter(|| {
            pipeline.submit_at(
                CaptureFrame::mono(black_box(&capture)),
                start + Duration::from_millis(1),
            )
        })
    });
}

fn benchmark_i16_intake(c: &mut Criterion) {
    let config = AnalyzerConfig {
        min_publish_interval_ms: 0,
        ..AnalyzerConfig::compact()
    };
    let (mut pipeline, _receiver) = SpectrumPipeline::new(&config, 48000.0).unwrap();
    let capture: Vec<i16> = (0..2048).map(|i| ((i * 37) % 2000) as i16 - 1000).collect();

    c.bench_function("i16_stereo_1024", |b| {
        b.iter(|| {
            pipeline.submit_converted(black_box(&capture), 2, |s: i16| s as f32 / 32768.0)
        })
    });
}

criterion_group!(benches, benchmark_submit, benchmark_throttled, benchmark_i16_intake);
criterion_main!(benches);
