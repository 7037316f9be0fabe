//! Real-input FFT
//!
//! Radix-2 transform for power-of-two frame sizes, using the packed layout for
//! real signals: N real samples are treated as N/2 complex samples
//! (`z[k] = x[2k] + i·x[2k+1]`), transformed with an N/2-point complex FFT,
//! then split back into the first N/2 bins of the real signal's spectrum.
//!
//! # Architecture
//!
//! All setup (bit-reversal permutation, butterfly twiddles, split twiddles) is
//! computed once in [`RealFft::new`] and never mutated afterwards.
//! [`RealFft::process`] takes `&self` and only touches the caller's output
//! buffer, so the same setup can serve every frame of a session.
//!
//! Output layout: `output[0]` is the DC bin (imaginary part zero), `output[k]`
//! for `k in 1..N/2` are the positive-frequency bins. The Nyquist bin is not
//! part of the output.

use rustfft::num_complex::Complex32;

use crate::error::{validate_frame_size, DspError};

/// Precomputed radix-2 real FFT for one frame size
#[derive(Debug, Clone)]
pub struct RealFft {
    /// Real input length N
    size: usize,
    /// Bit-reversed index for each of the N/2 packed complex samples
    bit_reverse: Vec<u32>,
    /// `e^(-2πij / (N/2))` for `j in 0..N/4`, shared by every butterfly stage
    twiddles: Vec<Complex32>,
    /// `e^(-2πik / N)` for `k in 0..N/2`, used to split the packed result
    split_twiddles: Vec<Complex32>,
}

impl RealFft {
    /// Build the transform setup for `size` real samples
    pub fn new(size: usize) -> Result<Self, DspError> {
        validate_frame_size(size)?;

        let half = size / 2;
        let bits = half.trailing_zeros();

        let bit_reverse = (0..half).map(|i| reverse_bits(i, bits) as u32).collect();
        let twiddles = (0..half / 2).map(|j| twiddle(j, half)).collect();
        let split_twiddles = (0..half).map(|k| twiddle(k, size)).collect();

        Ok(Self {
            size,
            bit_reverse,
            twiddles,
            split_twiddles,
        })
    }

    /// Real input length
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of output bins (N/2)
    pub fn bins(&self) -> usize {
        self.size / 2
    }

    /// Transform `input` (N real samples) into `output` (N/2 complex bins)
    ///
    /// # Real-time Safety
    /// No allocations, O(N log N) time, no state kept between calls.
    ///
    /// # Panics
    /// If `input.len() != N` or `output.len() != N/2`.
    pub fn process(&self, input: &[f32], output: &mut [Complex32]) {
        assert_eq!(input.len(), self.size, "fft input length");
        assert_eq!(output.len(), self.size / 2, "fft output length");

        let half = self.size / 2;

        // Pack sample pairs as complex values, already in bit-reversed order
        for (k, pair) in input.chunks_exact(2).enumerate() {
            output[self.bit_reverse[k] as usize] = Complex32::new(pair[0], pair[1]);
        }

        // Iterative decimation-in-time butterflies
        let mut len = 2;
        while len <= half {
            let span = len / 2;
            let stride = half / len;
            for start in (0..half).step_by(len) {
                for k in 0..span {
                    let w = self.twiddles[k * stride];
                    let t = output[start + k + span] * w;
                    let u = output[start + k];
                    output[start + k] = u + t;
                    output[start + k + span] = u - t;
                }
            }
            len <<= 1;
        }

        self.split(output);
    }

    /// Recover the real signal's bins from the packed N/2-point result
    ///
    /// With `Z` the packed spectrum and `W = e^(-2πik/N)`:
    /// `X[k] = E[k] + W·O[k]` where `E[k] = (Z[k] + conj Z[N/2-k]) / 2` and
    /// `O[k] = -i (Z[k] - conj Z[N/2-k]) / 2`. Bins `k` and `N/2-k` are
    /// computed together so the split runs in place.
    #[inline]
    fn split(&self, output: &mut [Complex32]) {
        let half = output.len();

        let z0 = output[0];
        output[0] = Complex32::new(z0.re + z0.im, 0.0);

        let minus_half_i = Complex32::new(0.0, -0.5);
        for k in 1..half / 2 {
            let zk = output[k];
            let zm = output[half - k].conj();

            let even = (zk + zm) * 0.5;
            let odd = (zk - zm) * minus_half_i;
            let t = self.split_twiddles[k] * odd;

            output[k] = even + t;
            output[half - k] = (even - t).conj();
        }

        // Middle bin pairs with itself: X[N/4] = conj Z[N/4]
        let mid = half / 2;
        output[mid] = output[mid].conj();
    }
}

/// `e^(-2πik / n)`, evaluated in f64 so the table carries full f32 precision
fn twiddle(k: usize, n: usize) -> Complex32 {
    let angle = -2.0 * std::f64::consts::PI * k as f64 / n as f64;
    Complex32::new(angle.cos() as f32, angle.sin() as f32)
}

fn reverse_bits(value: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    value.reverse_bits() >> (usize::BITS - bits)
}
