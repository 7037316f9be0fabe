//! Spectrum Pipeline
//!
//! One analysis session: Assembler → Window → FFT → Estimator → Throttle →
//! snapshot handoff. Everything is sized and computed in [`SpectrumPipeline::new`];
//! the per-frame entry points only touch preallocated buffers.
//!
//! The pipeline is moved into the capture callback, so the device thread is
//! its only user for the lifetime of the stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use devscope_dsp::{
    CaptureFrame, Complex32, FrameAssembler, FrequencyAxis, RealFft, SpectrumEstimator,
    WindowCoefficients,
};

use crate::config::AnalyzerConfig;
use crate::error::{EngineError, EngineResult};
use crate::snapshot::{self, SpectrumPublisher, SpectrumReceiver};
use crate::throttle::PublishThrottle;

/// Counters shared between the capture callback and the control thread
#[derive(Debug, Default)]
pub struct PipelineStats {
    frames_received: AtomicU64,
    spectra_published: AtomicU64,
    frames_dropped: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    // Relaxed is enough: each counter is independent and only read for reporting
    fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_published(&self) {
        self.spectra_published.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    pub fn spectra_published(&self) -> u64 {
        self.spectra_published.load(Ordering::Relaxed)
    }

    /// Frames rejected by the publish throttle
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }
}

/// Fully built analysis chain for one capture session
pub struct SpectrumPipeline {
    config: AnalyzerConfig,
    assembler: FrameAssembler,
    window: WindowCoefficients,
    fft: RealFft,
    estimator: SpectrumEstimator,
    axis: FrequencyAxis,
    throttle: PublishThrottle,
    publisher: SpectrumPublisher,

    // Work buffers, reused every cycle
    windowed: Vec<f32>,
    bins: Vec<Complex32>,
    magnitudes: Vec<f32>,

    stats: Arc<PipelineStats>,
}

impl SpectrumPipeline {
    /// Build every stage for `config` at the device's `sample_rate`
    ///
    /// Returns the pipeline together with the consumer side of its snapshot
    /// handoff. Nothing is partially built on error.
    pub fn new(
        config: &AnalyzerConfig,
        sample_rate: f32,
    ) -> EngineResult<(Self, SpectrumReceiver)> {
        config.validate().map_err(EngineError::ConfigError)?;

        let size = config.frame_size;
        let axis = FrequencyAxis::new(sample_rate, size)?;
        let assembler = FrameAssembler::new(size)?;
        let window = WindowCoefficients::hann(size, config.window_gain)?;
        let fft = RealFft::new(size)?;
        let estimator =
            SpectrumEstimator::new(config.magnitude_floor, config.bin_scaling.factor(size))?;

        let (publisher, receiver) = snapshot::channel(axis.clone(), estimator.floor_db());
        let bin_count = fft.bins();

        let pipeline = Self {
            config: config.clone(),
            assembler,
            window,
            fft,
            estimator,
            axis,
            throttle: PublishThrottle::new(config.min_publish_interval()),
            publisher,
            windowed: vec![0.0; size],
            bins: vec![Complex32::new(0.0, 0.0); bin_count],
            magnitudes: vec![0.0; bin_count],
            stats: Arc::new(PipelineStats::new()),
        };

        Ok((pipeline, receiver))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn frequency_axis(&self) -> &FrequencyAxis {
        &self.axis
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Frame intake: analyze and publish if the throttle allows
    ///
    /// # Real-time Safety
    /// No allocations, no locks. Dropped frames skip the transform entirely.
    #[inline]
    pub fn submit(&mut self, capture: CaptureFrame<'_>) -> bool {
        self.submit_at(capture, Instant::now())
    }

    /// [`submit`](Self::submit) with an explicit arrival time
    pub fn submit_at(&mut self, capture: CaptureFrame<'_>, now: Instant) -> bool {
        if !self.admit(now) {
            return false;
        }
        let frame = self.assembler.assemble(capture);
        self.window.apply(frame, &mut self.windowed);
        self.transform_and_publish();
        true
    }

    /// Frame intake for non-f32 interleaved device formats
    pub fn submit_converted<T, F>(&mut self, data: &[T], channels: usize, convert: F) -> bool
    where
        T: Copy,
        F: Fn(T) -> f32,
    {
        if !self.admit(Instant::now()) {
            return false;
        }
        let frame = self.assembler.assemble_interleaved_with(data, channels, convert);
        self.window.apply(frame, &mut self.windowed);
        self.transform_and_publish();
        true
    }

    /// Run the full chain on `capture` without throttling or publishing
    pub fn analyze(&mut self, capture: CaptureFrame<'_>) -> &[f32] {
        let frame = self.assembler.assemble(capture);
        self.window.apply(frame, &mut self.windowed);
        self.fft.process(&self.windowed, &mut self.bins);
        self.estimator.estimate(&self.bins, &mut self.magnitudes);
        &self.magnitudes
    }

    fn admit(&mut self, now: Instant) -> bool {
        self.stats.record_received();
        if self.throttle.try_acquire(now) {
            true
        } else {
            self.stats.record_dropped();
            false
        }
    }

    fn transform_and_publish(&mut self) {
        self.fft.process(&self.windowed, &mut self.bins);
        self.estimator.estimate(&self.bins, &mut self.magnitudes);
        self.publisher.publish(&self.magnitudes);
        self.stats.record_published();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::BinScaling;

    fn sine(freq: f32, sample_rate: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| {
                amplitude * (2.0 * std::f32::consts::PI * freq * n as f32 / sample_rate).sin()
            })
            .collect()
    }

    fn argmax(values: &[f32]) -> usize {
        values
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |(bi, bv), (i, &v)| {
                if v > bv {
                    (i, v)
                } else {
                    (bi, bv)
                }
            })
            .0
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalyzerConfig {
            frame_size: 1000,
            ..Default::default()
        };
        assert!(matches!(
            SpectrumPipeline::new(&config, 48000.0),
            Err(EngineError::ConfigError(_))
        ));

        assert!(matches!(
            SpectrumPipeline::new(&AnalyzerConfig::default(), 0.0),
            Err(EngineError::DspError(_))
        ));
    }

    #[test]
    fn test_silence_reads_floor() {
        let config = AnalyzerConfig::compact();
        let (mut pipeline, mut receiver) = SpectrumPipeline::new(&config, 48000.0).unwrap();

        assert!(pipeline.submit(CaptureFrame::mono(&vec![0.0; 1024])));

        let snapshot = receiver.latest().unwrap();
        let floor_db = 20.0 * config.magnitude_floor.log10();
        assert_eq!(snapshot.len(), 512);
        for &db in &snapshot.magnitudes_db {
            assert!(db.is_finite());
            assert!((db - floor_db).abs() < 1e-3);
        }
    }

    #[test]
    fn test_end_to_end_sine() {
        let config = AnalyzerConfig {
            frame_size: 1024,
            ..AnalyzerConfig::compact()
        };
        let (mut pipeline, mut receiver) = SpectrumPipeline::new(&config, 44100.0).unwrap();

        let samples = sine(440.0, 44100.0, 0.5, 1024);
        assert!(pipeline.submit(CaptureFrame::mono(&samples)));

        let snapshot = receiver.latest().unwrap();
        assert_eq!(snapshot.frequencies.as_slice()[0], 0.0);
        assert!((snapshot.frequencies.as_slice()[1] - 43.066).abs() < 0.01);
        assert_eq!(snapshot.magnitudes_db.len(), snapshot.frequencies.len());

        let peak = argmax(&snapshot.magnitudes_db);
        let expected = snapshot.frequencies.nearest_bin(440.0);
        assert_eq!(expected, 10);
        assert!(peak.abs_diff(expected) <= 1, "peak at bin {}", peak);

        let (peak_freq, _) = snapshot.peak().unwrap();
        assert!((peak_freq - 440.0).abs() < 50.0);
    }

    #[test]
    fn test_amplitude_scaling_reads_near_zero_db() {
        let config = AnalyzerConfig {
            frame_size: 4096,
            window_gain: 1.0,
            bin_scaling: BinScaling::Amplitude,
            ..AnalyzerConfig::detailed()
        };
        let (mut pipeline, _receiver) = SpectrumPipeline::new(&config, 48000.0).unwrap();

        // Bin-centered full-scale sine: Hann coherent gain is 0.5 (-6 dB)
        let bin = 100;
        let freq = bin as f32 * 48000.0 / 4096.0;
        let db = pipeline.analyze(CaptureFrame::mono(&sine(freq, 48000.0, 1.0, 4096)))[bin];
        assert!((db + 6.02).abs() < 0.5, "{} dB", db);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let (mut pipeline, _receiver) =
            SpectrumPipeline::new(&AnalyzerConfig::default(), 48000.0).unwrap();
        let samples = sine(1234.5, 48000.0, 0.3, 4096);

        let first = pipeline.analyze(CaptureFrame::mono(&samples)).to_vec();
        let second = pipeline.analyze(CaptureFrame::mono(&samples)).to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stereo_downmix_matches_mono() {
        let (mut pipeline, _receiver) =
            SpectrumPipeline::new(&AnalyzerConfig::compact(), 48000.0).unwrap();
        let mono = sine(1000.0, 48000.0, 0.5, 1024);
        let stereo: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();

        let from_mono = pipeline.analyze(CaptureFrame::mono(&mono)).to_vec();
        let from_stereo = pipeline
            .analyze(CaptureFrame::interleaved(&stereo, 2))
            .to_vec();
        assert_eq!(from_mono, from_stereo);
    }

    #[test]
    fn test_throttle_drops_excess_frames() {
        let config = AnalyzerConfig {
            min_publish_interval_ms: 50,
            ..AnalyzerConfig::compact()
        };
        let (mut pipeline, mut receiver) = SpectrumPipeline::new(&config, 48000.0).unwrap();
        let stats = pipeline.stats();
        let start = Instant::now();
        let quiet = vec![0.0; 1024];
        let loud = sine(1000.0, 48000.0, 0.9, 1024);

        assert!(pipeline.submit_at(CaptureFrame::mono(&quiet), start));
        assert!(!pipeline.submit_at(CaptureFrame::mono(&loud), start + Duration::from_millis(10)));
        assert!(!pipeline.submit_at(CaptureFrame::mono(&loud), start + Duration::from_millis(20)));

        // Dropped frames never reach the consumer
        let floor_db = 20.0 * config.magnitude_floor.log10();
        let snapshot = receiver.latest().unwrap();
        assert_eq!(snapshot.sequence, 1);
        assert!(snapshot.magnitudes_db.iter().all(|&db| (db - floor_db).abs() < 1e-3));

        assert!(pipeline.submit_at(CaptureFrame::mono(&loud), start + Duration::from_millis(60)));
        assert_eq!(receiver.latest().unwrap().sequence, 2);

        assert_eq!(stats.frames_received(), 4);
        assert_eq!(stats.spectra_published(), 2);
        assert_eq!(stats.frames_dropped(), 2);
    }

    #[test]
    fn test_consumer_sees_only_latest() {
        let config = AnalyzerConfig {
            min_publish_interval_ms: 0,
            ..AnalyzerConfig::compact()
        };
        let (mut pipeline, mut receiver) = SpectrumPipeline::new(&config, 48000.0).unwrap();

        for freq in [500.0, 2000.0, 8000.0] {
            pipeline.submit(CaptureFrame::mono(&sine(freq, 48000.0, 0.5, 1024)));
        }

        let snapshot = receiver.latest().unwrap();
        assert_eq!(snapshot.sequence, 3);
        let (peak_freq, _) = snapshot.peak().unwrap();
        assert!((peak_freq - 8000.0).abs() < 100.0);
    }

    #[test]
    fn test_short_and_empty_frames_are_absorbed() {
        let config = AnalyzerConfig {
            min_publish_interval_ms: 0,
            ..AnalyzerConfig::compact()
        };
        let (mut pipeline, mut receiver) = SpectrumPipeline::new(&config, 48000.0).unwrap();

        assert!(pipeline.submit(CaptureFrame::mono(&[0.5; 100])));
        assert!(pipeline.submit(CaptureFrame::Empty));
        assert!(pipeline.submit(CaptureFrame::interleaved(&[0.1, 0.2, 0.3], 2)));

        let snapshot = receiver.latest().unwrap();
        assert!(snapshot.magnitudes_db.iter().all(|db| db.is_finite()));
    }

    #[test]
    fn test_integer_samples_converted() {
        let config = AnalyzerConfig {
            min_publish_interval_ms: 0,
            ..AnalyzerConfig::compact()
        };
        let (mut pipeline, mut receiver) = SpectrumPipeline::new(&config, 48000.0).unwrap();
        let floats = sine(3000.0, 48000.0, 0.5, 1024);
        let ints: Vec<i16> = floats.iter().map(|&s| (s * 32767.0) as i16).collect();

        assert!(pipeline.submit_converted(&ints, 1, |s: i16| s as f32 / 32768.0));

        let snapshot = receiver.latest().unwrap();
        let (peak_freq, _) = snapshot.peak().unwrap();
        assert!((peak_freq - 3000.0).abs() < 100.0);
    }
}
