//! Hann Window
//!
//! Precomputed analysis window applied to every frame before the FFT to
//! reduce spectral leakage.

use std::f32::consts::PI;

use crate::error::{validate_frame_size, DspError};

/// Gain of the normalized Hann window (sqrt(2/3))
pub const HANN_NORM_GAIN: f32 = 0.8165;

/// Hann window coefficient for sample `n` of a `size`-point window
fn hann_window(n: usize, size: usize) -> f32 {
    0.5 * (1.0 - (2.0 * PI * n as f32 / (size - 1) as f32).cos())
}

/// Pre-computed Hann window lookup table
///
/// Built once per session and shared read-only by every analysis cycle.
#[derive(Debug, Clone)]
pub struct WindowCoefficients {
    coeffs: Vec<f32>,
}

impl WindowCoefficients {
    /// Build a `size`-point Hann window scaled by `gain`
    pub fn hann(size: usize, gain: f32) -> Result<Self, DspError> {
        validate_frame_size(size)?;
        if !(gain.is_finite() && gain > 0.0) {
            return Err(DspError::InvalidWindowGain(gain));
        }

        let coeffs = (0..size).map(|n| gain * hann_window(n, size)).collect();
        Ok(Self { coeffs })
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coeffs
    }

    /// Multiply `input` by the window into `output`
    ///
    /// # Panics
    /// If either slice length differs from the window length.
    #[inline]
    pub fn apply(&self, input: &[f32], output: &mut [f32]) {
        assert_eq!(input.len(), self.coeffs.len(), "window input length");
        assert_eq!(output.len(), self.coeffs.len(), "window output length");

        for ((out, &sample), &w) in output.iter_mut().zip(input).zip(&self.coeffs) {
            *out = sample * w;
        }
    }

    /// Multiply `samples` by the window in place
    #[inline]
    pub fn apply_in_place(&self, samples: &mut [f32]) {
        assert_eq!(samples.len(), self.coeffs.len(), "window length");

        for (sample, &w) in samples.iter_mut().zip(&self.coeffs) {
            *sample *= w;
        }
    }
}
