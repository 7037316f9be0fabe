//! Analyzer Configuration

use std::time::Duration;

use devscope_dsp::{validate_frame_size, DbRange, HANN_NORM_GAIN};
use serde::{Deserialize, Serialize};

/// How raw FFT magnitudes are scaled before conversion to dB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinScaling {
    /// Multiply by `2/N`: a full-scale sine reads close to 0 dB (minus window loss)
    Amplitude,
    /// Raw DFT magnitudes
    Unscaled,
}

impl BinScaling {
    /// Linear factor for a `frame_size`-point transform
    pub fn factor(self, frame_size: usize) -> f32 {
        match self {
            BinScaling::Amplitude => 2.0 / frame_size as f32,
            BinScaling::Unscaled => 1.0,
        }
    }
}

/// Spectrum analyzer session configuration
///
/// The sample rate is not part of the configuration: it is negotiated with
/// the capture device when a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// FFT frame size in samples (power of two)
    pub frame_size: usize,

    /// Minimum time between two spectra handed to the consumer
    pub min_publish_interval_ms: u64,

    /// Smallest magnitude fed to the logarithm (strictly positive)
    pub magnitude_floor: f32,

    /// Lower bound of the display range, in dB
    pub db_min: f32,

    /// Upper bound of the display range, in dB
    pub db_max: f32,

    /// Hann window normalization constant
    #[serde(default = "default_window_gain")]
    pub window_gain: f32,

    /// Magnitude scaling applied before dB conversion
    #[serde(default = "default_bin_scaling")]
    pub bin_scaling: BinScaling,
}

fn default_window_gain() -> f32 {
    HANN_NORM_GAIN
}

fn default_bin_scaling() -> BinScaling {
    BinScaling::Amplitude
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::detailed()
    }
}

impl AnalyzerConfig {
    /// High-resolution tuning: 4096-point frames, -120..0 dB display range
    pub fn detailed() -> Self {
        Self {
            frame_size: 4096,
            min_publish_interval_ms: 50, // ~20 updates per second
            magnitude_floor: 1e-20,
            db_min: -120.0,
            db_max: 0.0,
            window_gain: HANN_NORM_GAIN,
            bin_scaling: BinScaling::Amplitude,
        }
    }

    /// Lightweight tuning: 1024-point frames, raw magnitudes, -50..50 dB range
    pub fn compact() -> Self {
        Self {
            frame_size: 1024,
            min_publish_interval_ms: 50,
            magnitude_floor: 1e-10,
            db_min: -50.0,
            db_max: 50.0,
            window_gain: HANN_NORM_GAIN,
            bin_scaling: BinScaling::Unscaled,
        }
    }

    pub fn min_publish_interval(&self) -> Duration {
        Duration::from_millis(self.min_publish_interval_ms)
    }

    pub fn db_range(&self) -> DbRange {
        DbRange::new(self.db_min, self.db_max)
    }

    /// Number of bins in every published spectrum
    pub fn bins(&self) -> usize {
        self.frame_size / 2
    }

    /// Frequency resolution in Hz at `sample_rate`
    pub fn resolution_hz(&self, sample_rate: f32) -> f32 {
        sample_rate / self.frame_size as f32
    }

    /// Time covered by one analysis frame, in milliseconds
    pub fn frame_duration_ms(&self, sample_rate: f32) -> f32 {
        (self.frame_size as f32 / sample_rate) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        validate_frame_size(self.frame_size).map_err(|e| e.to_string())?;
        if !self.magnitude_floor.is_normal() || self.magnitude_floor <= 0.0 {
            return Err(format!("Invalid magnitude floor: {}", self.magnitude_floor));
        }
        if !(self.db_min.is_finite() && self.db_max.is_finite()) || self.db_min >= self.db_max {
            return Err(format!(
                "Invalid dB range: {}..{}",
                self.db_min, self.db_max
            ));
        }
        if !(self.window_gain.is_finite() && self.window_gain > 0.0) {
            return Err(format!("Invalid window gain: {}", self.window_gain));
        }
        Ok(())
    }
}
