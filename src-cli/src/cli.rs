use clap::Parser;
use devscope_core::{AnalyzerConfig, AnalyzerSettings};

#[derive(Parser, Debug)]
#[command(name = "devscope", about = "Live audio input spectrum analyzer")]
pub struct Cli {
    /// List capture devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Capture device name (defaults to the saved device, then the system default)
    #[arg(short, long)]
    pub device: Option<String>,

    /// FFT frame size, power of two
    #[arg(short, long)]
    pub frame_size: Option<usize>,

    /// Minimum milliseconds between displayed spectra
    #[arg(short, long)]
    pub interval_ms: Option<u64>,

    /// Bottom of the display range in dB
    #[arg(long, allow_hyphen_values = true)]
    pub db_min: Option<f32>,

    /// Top of the display range in dB
    #[arg(long, allow_hyphen_values = true)]
    pub db_max: Option<f32>,

    /// Magnitude floor applied before the logarithm
    #[arg(long)]
    pub floor: Option<f32>,

    /// Start from the compact preset (1024-point frames, -50..50 dB, raw magnitudes)
    #[arg(long)]
    pub compact: bool,

    /// Number of bars in the terminal display
    #[arg(short, long)]
    pub bars: Option<usize>,

    /// Stop after this many seconds (runs until interrupted otherwise)
    #[arg(long)]
    pub duration: Option<f64>,

    /// Persist the resulting settings for future runs
    #[arg(long)]
    pub save: bool,
}

impl Cli {
    /// Layer command-line overrides on top of stored settings
    pub fn apply(&self, settings: &mut AnalyzerSettings) {
        if self.compact {
            settings.analyzer = AnalyzerConfig::compact();
        }
        if let Some(device) = &self.device {
            settings.input_device = Some(device.clone());
        }

        let analyzer = &mut settings.analyzer;
        if let Some(frame_size) = self.frame_size {
            analyzer.frame_size = frame_size;
        }
        if let Some(interval) = self.interval_ms {
            analyzer.min_publish_interval_ms = interval;
        }
        if let Some(db_min) = self.db_min {
            analyzer.db_min = db_min;
        }
        if let Some(db_max) = self.db_max {
            analyzer.db_max = db_max;
        }
        if let Some(floor) = self.floor {
            analyzer.magnitude_floor = floor;
        }
        if let Some(bars) = self.bars {
            settings.display.bar_count = bars.max(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_overrides_keeps_settings() {
        let cli = Cli::parse_from(["devscope"]);
        let mut settings = AnalyzerSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings, AnalyzerSettings::default());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "devscope",
            "--device",
            "Line In",
            "--frame-size",
            "2048",
            "--interval-ms",
            "100",
            "--db-min",
            "-90",
            "--db-max",
            "-10",
            "--bars",
            "24",
        ]);
        let mut settings = AnalyzerSettings::default();
        cli.apply(&mut settings);

        assert_eq!(settings.input_device.as_deref(), Some("Line In"));
        assert_eq!(settings.analyzer.frame_size, 2048);
        assert_eq!(settings.analyzer.min_publish_interval_ms, 100);
        assert_eq!(settings.analyzer.db_min, -90.0);
        assert_eq!(settings.analyzer.db_max, -10.0);
        assert_eq!(settings.display.bar_count, 24);
        assert!(settings.analyzer.validate().is_ok());
    }

    #[test]
    fn test_compact_preset_then_overrides() {
        let cli = Cli::parse_from(["devscope", "--compact", "--frame-size", "512"]);
        let mut settings = AnalyzerSettings::default();
        cli.apply(&mut settings);

        assert_eq!(settings.analyzer.frame_size, 512);
        assert_eq!(settings.analyzer.db_min, -50.0);
        assert_eq!(settings.analyzer.db_max, 50.0);
    }

    #[test]
    fn test_invalid_frame_size_is_caught_by_validation() {
        let cli = Cli::parse_from(["devscope", "--frame-size", "1000"]);
        let mut settings = AnalyzerSettings::default();
        cli.apply(&mut settings);
        assert!(settings.analyzer.validate().is_err());
    }
}
