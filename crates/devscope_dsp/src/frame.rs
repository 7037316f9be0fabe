//! Frame Assembly
//!
//! Reduces whatever the capture device delivers (any channel count, any
//! length, possibly nothing at all) to exactly one fixed-length mono
//! analysis frame.
//!
//! Rules:
//! - `copy_count = min(samples_per_channel, frame_size)`
//! - mono input is copied, multi-channel input is averaged (unweighted downmix)
//! - positions past `copy_count` are zero padding
//! - missing data is silence, never an error

use crate::error::{validate_frame_size, DspError};

/// Raw samples handed over by the capture device for one callback
#[derive(Debug, Clone, Copy)]
pub enum CaptureFrame<'a> {
    /// Interleaved samples `[c0, c1, .., c0, c1, ..]`, the layout cpal delivers
    Interleaved { samples: &'a [f32], channels: usize },

    /// One slice per channel
    Planar(&'a [&'a [f32]]),

    /// The device delivered no sample data
    Empty,
}

impl<'a> CaptureFrame<'a> {
    /// Single-channel frame
    pub fn mono(samples: &'a [f32]) -> Self {
        Self::Interleaved {
            samples,
            channels: 1,
        }
    }

    /// Interleaved frame with `channels` channels
    pub fn interleaved(samples: &'a [f32], channels: usize) -> Self {
        Self::Interleaved { samples, channels }
    }

    /// Number of channels carried by this frame (0 for an empty frame)
    pub fn channel_count(&self) -> usize {
        match self {
            Self::Interleaved { channels, .. } => *channels,
            Self::Planar(planes) => planes.len(),
            Self::Empty => 0,
        }
    }

    /// Number of complete samples per channel
    ///
    /// A trailing partial interleaved frame is not counted. Ragged planar
    /// input counts the shortest channel.
    pub fn sample_count(&self) -> usize {
        match self {
            Self::Interleaved { samples, channels } => {
                if *channels == 0 {
                    0
                } else {
                    samples.len() / channels
                }
            }
            Self::Planar(planes) => planes.iter().map(|p| p.len()).min().unwrap_or(0),
            Self::Empty => 0,
        }
    }
}

/// Accumulates capture data into a reusable analysis frame
///
/// The frame buffer is allocated once; `assemble*` never allocates.
pub struct FrameAssembler {
    frame: Vec<f32>,
}

impl FrameAssembler {
    /// Create an assembler producing frames of `frame_size` samples
    pub fn new(frame_size: usize) -> Result<Self, DspError> {
        validate_frame_size(frame_size)?;
        Ok(Self {
            frame: vec![0.0; frame_size],
        })
    }

    /// Length of every produced frame
    pub fn frame_size(&self) -> usize {
        self.frame.len()
    }

    /// The most recently assembled frame
    pub fn frame(&self) -> &[f32] {
        &self.frame
    }

    /// Reduce one capture frame to a mono analysis frame
    ///
    /// # Real-time Safety
    /// No allocations, O(frame_size * channels).
    pub fn assemble(&mut self, capture: CaptureFrame<'_>) -> &[f32] {
        match capture {
            CaptureFrame::Interleaved { samples, channels } => {
                self.assemble_interleaved_with(samples, channels, |s| s)
            }
            CaptureFrame::Planar(planes) => self.assemble_planar(planes),
            CaptureFrame::Empty => {
                self.frame.fill(0.0);
                &self.frame
            }
        }
    }

    /// Reduce interleaved samples of any type, converting each one to f32
    ///
    /// Used for integer device formats so no intermediate f32 buffer is needed.
    pub fn assemble_interleaved_with<T, F>(
        &mut self,
        data: &[T],
        channels: usize,
        convert: F,
    ) -> &[f32]
    where
        T: Copy,
        F: Fn(T) -> f32,
    {
        self.frame.fill(0.0);
        if channels == 0 {
            return &self.frame;
        }

        let copy_count = (data.len() / channels).min(self.frame.len());

        if channels == 1 {
            for (dst, &src) in self.frame[..copy_count].iter_mut().zip(data) {
                *dst = convert(src);
            }
        } else {
            for (dst, chunk) in self.frame[..copy_count]
                .iter_mut()
                .zip(data.chunks_exact(channels))
            {
                *dst = chunk.iter().map(|&s| convert(s)).sum();
            }
            scale(&mut self.frame[..copy_count], 1.0 / channels as f32);
        }

        &self.frame
    }

    fn assemble_planar(&mut self, planes: &[&[f32]]) -> &[f32] {
        self.frame.fill(0.0);
        let channels = planes.len();
        if channels == 0 {
            return &self.frame;
        }

        let samples = planes.iter().map(|p| p.len()).min().unwrap_or(0);
        let copy_count = samples.min(self.frame.len());

        if channels == 1 {
            self.frame[..copy_count].copy_from_slice(&planes[0][..copy_count]);
        } else {
            for plane in planes {
                for (dst, &src) in self.frame[..copy_count].iter_mut().zip(plane.iter()) {
                    *dst += src;
                }
            }
            scale(&mut self.frame[..copy_count], 1.0 / channels as f32);
        }

        &self.frame
    }
}

#[inline]
fn scale(samples: &mut [f32], factor: f32) {
    for s in samples {
        *s *= factor;
    }
}
