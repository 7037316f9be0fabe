//! Capture Stream
//!
//! Binds a cpal input device to a [`SpectrumPipeline`]. The pipeline is built
//! first, then moved into the data callback, then the stream is armed. Pausing
//! and dropping the stream drops the pipeline with it, so no callback can ever
//! see a half-built or torn-down session.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{
    BufferSize, Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig,
    SupportedBufferSize,
};
use crossbeam_channel::Sender;
use devscope_dsp::{CaptureFrame, FrequencyAxis};
use tracing::{debug, error};

use crate::config::AnalyzerConfig;
use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use crate::pipeline::{PipelineStats, SpectrumPipeline};
use crate::snapshot::SpectrumReceiver;

/// A running capture session
pub struct CaptureStream {
    /// Kept alive to keep the callback (and the pipeline inside it) running
    stream: Stream,
    device_name: String,
    sample_rate: u32,
    channels: u16,
    frequency_axis: FrequencyAxis,
    stats: Arc<PipelineStats>,
}

impl CaptureStream {
    /// Open and start capturing from `device` with the device's default input
    /// format
    ///
    /// # Arguments
    ///
    /// * `device` - Capture device
    /// * `config` - Analyzer configuration for this session
    /// * `event_sender` - Channel for asynchronous stream errors
    pub fn open(
        device: &Device,
        config: &AnalyzerConfig,
        event_sender: Sender<Event>,
    ) -> EngineResult<(Self, SpectrumReceiver)> {
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;
        let sample_format = supported.sample_format();
        let buffer_size = frame_buffer_size(supported.buffer_size(), config.frame_size);
        let stream_config = StreamConfig {
            buffer_size,
            ..supported.config()
        };
        let sample_rate = stream_config.sample_rate.0;
        let channels = stream_config.channels;

        debug!(
            "Input stream config for '{}': {} Hz, {} channels, {:?}, buffer {:?}",
            device_name, sample_rate, channels, sample_format, stream_config.buffer_size
        );

        // Everything the callback needs exists before the stream does
        let (pipeline, receiver) = SpectrumPipeline::new(config, sample_rate as f32)?;
        let frequency_axis = pipeline.frequency_axis().clone();
        let stats = pipeline.stats();

        let stream = match sample_format {
            SampleFormat::F32 => {
                Self::build_f32_stream(device, &stream_config, pipeline, event_sender)?
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(device, &stream_config, pipeline, event_sender)?
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(device, &stream_config, pipeline, event_sender)?
            }
            other => {
                return Err(EngineError::UnsupportedSampleFormat(format!("{:?}", other)));
            }
        };

        stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

        Ok((
            Self {
                stream,
                device_name,
                sample_rate,
                channels,
                frequency_axis,
                stats,
            },
            receiver,
        ))
    }

    fn build_f32_stream(
        device: &Device,
        config: &StreamConfig,
        mut pipeline: SpectrumPipeline,
        event_sender: Sender<Event>,
    ) -> EngineResult<Stream> {
        let channels = config.channels as usize;

        device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Real-time audio callback - NO allocations allowed here
                    pipeline.submit(CaptureFrame::interleaved(data, channels));
                },
                Self::error_callback(event_sender),
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))
    }

    /// Integer formats are converted sample-by-sample while the frame is assembled
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        mut pipeline: SpectrumPipeline,
        event_sender: Sender<Event>,
    ) -> EngineResult<Stream>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let channels = config.channels as usize;

        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    pipeline.submit_converted(data, channels, |s: T| s.to_sample::<f32>());
                },
                Self::error_callback(event_sender),
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))
    }

    fn error_callback(
        event_sender: Sender<Event>,
    ) -> impl FnMut(cpal::StreamError) + Send + 'static {
        move |err| {
            error!("Capture stream error: {}", err);
            let _ = event_sender.try_send(Event::error(err));
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frequency_axis(&self) -> &FrequencyAxis {
        &self.frequency_axis
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    /// Pause the device and release the stream together with its pipeline
    pub fn stop(self) {
        if let Err(e) = self.stream.pause() {
            debug!("Pausing capture stream failed: {}", e);
        }
    }
}

/// Device buffer size for one analysis frame per callback
///
/// Asks for `frame_size` frames, clamped to what the device reports. Devices
/// that don't report a range keep their default.
fn frame_buffer_size(supported: &SupportedBufferSize, frame_size: usize) -> BufferSize {
    match *supported {
        SupportedBufferSize::Range { min, max } => {
            let wanted = u32::try_from(frame_size).unwrap_or(u32::MAX);
            BufferSize::Fixed(wanted.clamp(min, max.max(min)))
        }
        SupportedBufferSize::Unknown => BufferSize::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffer_size_within_range() {
        let range = SupportedBufferSize::Range { min: 64, max: 8192 };
        assert_eq!(frame_buffer_size(&range, 4096), BufferSize::Fixed(4096));
        assert_eq!(frame_buffer_size(&range, 1024), BufferSize::Fixed(1024));
    }

    #[test]
    fn test_frame_buffer_size_clamped() {
        let range = SupportedBufferSize::Range { min: 256, max: 2048 };
        assert_eq!(frame_buffer_size(&range, 4096), BufferSize::Fixed(2048));
        assert_eq!(frame_buffer_size(&range, 64), BufferSize::Fixed(256));
    }

    #[test]
    fn test_frame_buffer_size_unknown_keeps_default() {
        let unknown = SupportedBufferSize::Unknown;
        assert_eq!(frame_buffer_size(&unknown, 4096), BufferSize::Default);
    }
    use crate::device::InputDevice;

    // Hardware-dependent tests
    #[test]
    #[ignore = "requires audio hardware"]
    fn test_capture_open_and_stop() {
        let (sender, _receiver) = crossbeam_channel::unbounded();
        let Ok(device) = InputDevice::find(None) else {
            return;
        };

        let config = AnalyzerConfig::compact();
        if let Ok((stream, _spectrum)) = CaptureStream::open(&device, &config, sender) {
            assert!(stream.sample_rate() > 0);
            assert!(stream.channels() > 0);
            assert_eq!(stream.frequency_axis().len(), config.bins());
            stream.stop();
        }
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_capture_publishes_spectra() {
        let (sender, _receiver) = crossbeam_channel::unbounded();
        let Ok(device) = InputDevice::find(None) else {
            return;
        };

        let config = AnalyzerConfig::compact();
        if let Ok((stream, mut spectrum)) = CaptureStream::open(&device, &config, sender) {
            std::thread::sleep(std::time::Duration::from_millis(500));
            assert!(stream.stats().frames_received() > 0);
            if let Some(snapshot) = spectrum.latest() {
                assert_eq!(snapshot.len(), config.bins());
            }
            stream.stop();
        }
    }
}
