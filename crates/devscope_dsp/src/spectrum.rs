//! Spectrum Estimation
//!
//! Converts complex FFT bins to a decibel magnitude spectrum:
//! `db = 20 * log10(max(|bin| * scale, floor))`.
//!
//! The floor is strictly positive, so every output value is finite, including
//! for digital silence.

use rustfft::num_complex::Complex32;

use crate::error::DspError;

/// Magnitude → decibel converter with a numeric floor
#[derive(Debug, Clone, Copy)]
pub struct SpectrumEstimator {
    /// Smallest magnitude fed to the logarithm
    floor: f32,
    /// Linear factor applied to every magnitude before flooring
    scale: f32,
}

impl SpectrumEstimator {
    /// Create an estimator
    ///
    /// # Arguments
    /// * `floor` - Magnitude floor, must be a positive normal f32 (e.g. 1e-10)
    /// * `scale` - Linear magnitude scale, positive and finite (e.g. `2/N` for
    ///   amplitude-calibrated output)
    pub fn new(floor: f32, scale: f32) -> Result<Self, DspError> {
        if !floor.is_normal() || floor <= 0.0 {
            return Err(DspError::InvalidMagnitudeFloor(floor));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(DspError::InvalidMagnitudeScale(scale));
        }
        Ok(Self { floor, scale })
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Decibel value reported for a bin at or below the floor
    pub fn floor_db(&self) -> f32 {
        magnitude_to_db(self.floor)
    }

    /// Convert `bins` into decibels, one value per bin
    ///
    /// # Real-time Safety
    /// No allocations, O(n).
    ///
    /// # Panics
    /// If `bins` and `output` differ in length.
    #[inline]
    pub fn estimate(&self, bins: &[Complex32], output: &mut [f32]) {
        assert_eq!(bins.len(), output.len(), "spectrum length");

        for (db, bin) in output.iter_mut().zip(bins) {
            let magnitude = bin.norm_sqr().sqrt() * self.scale;
            *db = magnitude_to_db(magnitude.max(self.floor));
        }
    }
}

/// `20 * log10(magnitude)`
#[inline]
pub fn magnitude_to_db(magnitude: f32) -> f32 {
    20.0 * magnitude.log10()
}

/// Display range used to normalize decibel values into [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbRange {
    pub min: f32,
    pub max: f32,
}

impl DbRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Map `db` to [0, 1], clamping values outside the range
    #[inline]
    pub fn normalize(&self, db: f32) -> f32 {
        let span = self.span();
        if span <= 0.0 {
            return 0.0;
        }
        ((db - self.min) / span).clamp(0.0, 1.0)
    }

    /// Normalize a whole spectrum into `output`
    pub fn normalize_into(&self, spectrum: &[f32], output: &mut [f32]) {
        for (out, &db) in output.iter_mut().zip(spectrum) {
            *out = self.normalize(db);
        }
    }
}

impl Default for DbRange {
    fn default() -> Self {
        Self {
            min: -120.0,
            max: 0.0,
        }
    }
}
