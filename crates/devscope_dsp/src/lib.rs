//! devscope DSP - Digital Signal Processing Module
//!
//! This crate provides the numeric stages of the spectrum analyzer:
//! - Frame assembly with mono downmix and zero padding
//! - Precomputed Hann window
//! - Radix-2 real-input FFT with immutable per-size setup
//! - Magnitude to decibel estimation with a numeric floor
//! - Bin to frequency axis
//!
//! # Architecture
//!
//! Every stage follows a strict "no allocation in audio callback" rule.
//! Tables and buffers are sized when a stage is constructed; the per-frame
//! methods only read setup state and write into caller-provided or
//! preallocated buffers.

mod axis;
mod error;
mod fft;
mod frame;
mod spectrum;
mod window;

pub use axis::FrequencyAxis;
pub use error::{validate_frame_size, DspError};
pub use fft::RealFft;
pub use frame::{CaptureFrame, FrameAssembler};
pub use spectrum::{magnitude_to_db, DbRange, SpectrumEstimator};
pub use window::{WindowCoefficients, HANN_NORM_GAIN};

/// Complex bin type produced by [`RealFft`]
pub use rustfft::num_complex::Complex32;

/// Smallest supported analysis frame
pub const MIN_FRAME_SIZE: usize = 16;

/// Largest supported analysis frame
pub const MAX_FRAME_SIZE: usize = 65536;
