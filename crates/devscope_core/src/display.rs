//! Display Math
//!
//! Presentation helpers for spectrum consumers: log-frequency and dB
//! positioning, grid ticks and log-spaced bar reduction. Positions are
//! normalized to [0, 1]; scaling to pixels or terminal cells is up to the
//! caller.

use devscope_dsp::DbRange;

use crate::snapshot::SpectrumSnapshot;

/// Lowest frequency shown on a log axis; 0 Hz maps here
pub const MIN_DISPLAY_FREQUENCY: f32 = 20.0;

/// Spacing of horizontal grid lines
pub const DB_TICK_STEP: f32 = 20.0;

/// Frequency grid candidates, filtered by the axis maximum
pub const FREQUENCY_TICKS_HZ: [f32; 10] = [
    20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 20000.0,
];

/// One grid line
#[derive(Debug, Clone, PartialEq)]
pub struct GridTick {
    pub value: f32,
    /// Normalized position along its axis
    pub position: f32,
    pub label: Option<String>,
}

/// Horizontal position of `frequency` on a log axis ending at `max_frequency`
pub fn x_position(frequency: f32, max_frequency: f32) -> f32 {
    if max_frequency <= MIN_DISPLAY_FREQUENCY {
        return 0.0;
    }
    let log_min = MIN_DISPLAY_FREQUENCY.log10();
    let log_max = max_frequency.log10();
    let log_f = frequency.max(MIN_DISPLAY_FREQUENCY).log10();
    ((log_f - log_min) / (log_max - log_min)).clamp(0.0, 1.0)
}

/// Vertical position of `db`: `range.max` at 0 (top), `range.min` at 1
pub fn y_position(db: f32, range: DbRange) -> f32 {
    1.0 - range.normalize(db)
}

/// Horizontal grid every 20 dB from `range.min` through `range.max`
///
/// The bottom line carries no label.
pub fn db_ticks(range: DbRange) -> Vec<GridTick> {
    if range.span() <= 0.0 {
        return Vec::new();
    }

    let steps = (range.span() / DB_TICK_STEP).floor() as usize;
    (0..=steps)
        .map(|i| {
            let value = range.min + i as f32 * DB_TICK_STEP;
            GridTick {
                value,
                position: y_position(value, range),
                label: (i > 0).then(|| format!("{} dB", value as i32)),
            }
        })
        .collect()
}

/// Vertical grid at the standard frequencies up to `max_frequency`
pub fn frequency_ticks(max_frequency: f32) -> Vec<GridTick> {
    FREQUENCY_TICKS_HZ
        .iter()
        .filter(|&&f| f <= max_frequency)
        .map(|&f| GridTick {
            value: f,
            position: x_position(f, max_frequency),
            label: Some(frequency_label(f)),
        })
        .collect()
}

/// `"500"`, `"1k"`, `"20k"`
pub fn frequency_label(frequency: f32) -> String {
    if frequency >= 1000.0 {
        format!("{}k", (frequency / 1000.0) as i32)
    } else {
        format!("{}", frequency as i32)
    }
}

/// Reduce a spectrum to `count` log-spaced bars in [0, 1]
///
/// Each bar takes the loudest bin of its band. DC is skipped. Low bands
/// narrower than one bin reuse the nearest bin.
pub fn log_bars(snapshot: &SpectrumSnapshot, count: usize, range: DbRange) -> Vec<f32> {
    let mut bars = vec![0.0; count];
    let len = snapshot.len();
    if count == 0 || len < 2 {
        return bars;
    }

    // Bands span bins 1..len on a natural-log scale
    let log_max = (len as f32).ln();
    let log_step = log_max / count as f32;

    for (i, bar) in bars.iter_mut().enumerate() {
        let start = ((i as f32 * log_step).exp() as usize).clamp(1, len - 1);
        let end = (((i + 1) as f32 * log_step).exp() as usize).clamp(start + 1, len);

        let peak = snapshot.magnitudes_db[start..end]
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        *bar = range.normalize(peak);
    }

    bars
}
