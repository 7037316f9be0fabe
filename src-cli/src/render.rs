//! Single-line terminal rendering of a spectrum snapshot

use devscope_core::display::{frequency_label, log_bars};
use devscope_core::{DbRange, SpectrumSnapshot};

const LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Bar graph of `bar_count` log-spaced bands, optionally followed by the peak
pub fn render_line(
    snapshot: &SpectrumSnapshot,
    bar_count: usize,
    range: DbRange,
    show_peak: bool,
) -> String {
    let mut line: String = log_bars(snapshot, bar_count, range)
        .into_iter()
        .map(level_char)
        .collect();

    if show_peak {
        if let Some((freq, db)) = snapshot.peak() {
            line.push_str(&format!(" | peak {} ({:.1} dB)", format_frequency(freq), db));
        }
    }
    line
}

fn level_char(value: f32) -> char {
    let top = LEVELS.len() - 1;
    let index = (value.clamp(0.0, 1.0) * top as f32).round() as usize;
    LEVELS[index.min(top)]
}

fn format_frequency(freq: f32) -> String {
    if freq >= 1000.0 {
        format!("{:.2} kHz", freq / 1000.0)
    } else {
        format!("{} Hz", frequency_label(freq))
    }
}
