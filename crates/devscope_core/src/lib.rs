//! devscope Core - Analyzer Engine
//!
//! This crate turns a live capture device into a stream of decibel spectra:
//! - Input device enumeration and capture stream management (via CPAL)
//! - The per-session spectrum pipeline and its publish throttle
//! - Lock-free, supersede-only snapshot handoff to the consumer
//! - Persistent settings and display math for spectrum views
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Caller Thread                          │
//! │   start/stop/config ──commands──▶ Engine ◀──events──        │
//! │   latest_spectrum() ◀───────── triple buffer ─────┐         │
//! └───────────────────────────────────────────────────│─────────┘
//!                  │ crossbeam-channel                 │
//!                  ▼                                   │
//! ┌─────────────────────────────┐   ┌──────────────────┴────────┐
//! │   Control Thread            │   │   Device Thread (cpal)    │
//! │   builds / tears down the   │──▶│  Assemble ▶ Window ▶ FFT  │
//! │   CaptureStream             │   │  ▶ dB ▶ Throttle ▶ publish│
//! └─────────────────────────────┘   │ (zero allocation here)    │
//!                                   └───────────────────────────┘
//! ```

mod capture;
mod config;
mod device;
pub mod display;
mod engine;
mod error;
mod message;
mod pipeline;
mod settings;
mod snapshot;
mod throttle;

pub use capture::CaptureStream;
pub use config::{AnalyzerConfig, BinScaling};
pub use device::InputDevice;
pub use engine::AnalyzerEngine;
pub use error::{EngineError, EngineResult};
pub use message::{Command, Event};
pub use pipeline::{PipelineStats, SpectrumPipeline};
pub use settings::{AnalyzerSettings, DisplaySettings};
pub use snapshot::{channel, SpectrumPublisher, SpectrumReceiver, SpectrumSnapshot};
pub use throttle::PublishThrottle;

// Re-export DSP types for convenience
pub use devscope_dsp::{CaptureFrame, DbRange, DspError, FrequencyAxis, HANN_NORM_GAIN};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let config = AnalyzerConfig::default();
        let (_pipeline, mut receiver) = SpectrumPipeline::new(&config, 48000.0).unwrap();
        assert!(receiver.latest().is_none());
        let _settings = AnalyzerSettings::default();
        let _range: DbRange = config.db_range();
    }
}
