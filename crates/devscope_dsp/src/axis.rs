//! Frequency Axis
//!
//! Maps spectrum bin indices to frequencies: bin `i` ↦ `i * sample_rate / frame_size`.
//! Built once per session and shared (cheaply cloned) with every published
//! spectrum.

use std::sync::Arc;

use crate::error::{validate_frame_size, DspError};

/// Immutable bin → Hz table for one session
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyAxis {
    frequencies: Arc<[f32]>,
    sample_rate: f32,
    frame_size: usize,
}

impl FrequencyAxis {
    /// Build the axis for `frame_size`-point frames captured at `sample_rate` Hz
    pub fn new(sample_rate: f32, frame_size: usize) -> Result<Self, DspError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        validate_frame_size(frame_size)?;

        let resolution = sample_rate / frame_size as f32;
        let frequencies = (0..frame_size / 2)
            .map(|i| i as f32 * resolution)
            .collect();

        Ok(Self {
            frequencies,
            sample_rate,
            frame_size,
        })
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.frequencies
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Width of one bin in Hz
    pub fn resolution(&self) -> f32 {
        self.sample_rate / self.frame_size as f32
    }

    /// Highest frequency on the axis (last bin)
    pub fn max_frequency(&self) -> f32 {
        self.frequencies.last().copied().unwrap_or(0.0)
    }

    pub fn bin_frequency(&self, bin: usize) -> Option<f32> {
        self.frequencies.get(bin).copied()
    }

    /// Index of the bin closest to `frequency`, clamped to the axis
    pub fn nearest_bin(&self, frequency: f32) -> usize {
        let bin = (frequency / self.resolution()).round();
        if bin.is_nan() || bin <= 0.0 {
            return 0;
        }
        (bin as usize).min(self.len().saturating_sub(1))
    }
}
