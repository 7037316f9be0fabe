//! Spectrum Snapshot Handoff
//!
//! Single-slot exchange between the capture thread and the consumer, backed by
//! a lock-free triple buffer. Publishing supersedes: the consumer only ever
//! sees the most recent spectrum and nothing is queued.
//!
//! All three slots are allocated once per session and overwritten in place,
//! so publishing never allocates.

use devscope_dsp::{DbRange, FrequencyAxis};
use triple_buffer::TripleBuffer;

/// One published spectrum, index-aligned with its frequency axis
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumSnapshot {
    /// Publish counter, starting at 1 for the first spectrum of a session
    pub sequence: u64,
    /// Magnitude in dB per bin
    pub magnitudes_db: Vec<f32>,
    /// Bin center frequencies in Hz
    pub frequencies: FrequencyAxis,
}

impl SpectrumSnapshot {
    /// Snapshot with every bin at `floor_db` and sequence 0 (nothing published yet)
    pub fn silent(frequencies: FrequencyAxis, floor_db: f32) -> Self {
        Self {
            sequence: 0,
            magnitudes_db: vec![floor_db; frequencies.len()],
            frequencies,
        }
    }

    pub fn len(&self) -> usize {
        self.magnitudes_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes_db.is_empty()
    }

    /// Magnitudes mapped into [0, 1] with `range`
    pub fn normalized(&self, range: DbRange) -> Vec<f32> {
        let mut out = vec![0.0; self.magnitudes_db.len()];
        range.normalize_into(&self.magnitudes_db, &mut out);
        out
    }

    /// Loudest bin as `(frequency_hz, db)`
    pub fn peak(&self) -> Option<(f32, f32)> {
        self.magnitudes_db
            .iter()
            .zip(self.frequencies.as_slice())
            .fold(None, |best: Option<(f32, f32)>, (&db, &freq)| match best {
                Some((_, best_db)) if best_db >= db => best,
                _ => Some((freq, db)),
            })
    }
}

/// Write side, owned by the capture callback
pub struct SpectrumPublisher {
    input: triple_buffer::Input<SpectrumSnapshot>,
    sequence: u64,
}

impl SpectrumPublisher {
    /// Copy `magnitudes_db` into the back slot and make it the latest snapshot
    ///
    /// # Real-time Safety
    /// No allocations, no locks.
    ///
    /// # Panics
    /// If `magnitudes_db` does not match the axis length.
    pub fn publish(&mut self, magnitudes_db: &[f32]) -> u64 {
        self.sequence += 1;
        let slot = self.input.input_buffer_mut();
        slot.magnitudes_db.copy_from_slice(magnitudes_db);
        slot.sequence = self.sequence;
        self.input.publish();
        self.sequence
    }

    /// Number of snapshots published so far
    pub fn published(&self) -> u64 {
        self.sequence
    }
}

/// Read side, owned by the consumer
pub struct SpectrumReceiver {
    output: triple_buffer::Output<SpectrumSnapshot>,
}

impl SpectrumReceiver {
    /// Latest published snapshot, or `None` before the first publish
    pub fn latest(&mut self) -> Option<&SpectrumSnapshot> {
        let snapshot = self.output.read();
        if snapshot.sequence == 0 {
            None
        } else {
            Some(snapshot)
        }
    }

    /// Whether a snapshot newer than the last read is waiting
    pub fn has_update(&self) -> bool {
        self.output.updated()
    }
}

/// Create a connected publisher/receiver pair for one session
pub fn channel(frequencies: FrequencyAxis, floor_db: f32) -> (SpectrumPublisher, SpectrumReceiver) {
    let initial = SpectrumSnapshot::silent(frequencies, floor_db);
    let (input, output) = TripleBuffer::new(&initial).split();
    (
        SpectrumPublisher { input, sequence: 0 },
        SpectrumReceiver { output },
    )
}
