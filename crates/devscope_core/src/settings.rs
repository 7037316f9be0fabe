//! Persistent Settings Management
//!
//! Handles saving/loading analyzer preferences to disk.
//!
//! # Storage Locations
//! - Linux: `~/.config/devscope/settings.json`
//! - Windows: `%APPDATA%\devscope\devscope\config\settings.json`
//! - macOS: `~/Library/Application Support/com.devscope.devscope/settings.json`

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::AnalyzerConfig;

/// Presentation settings for spectrum consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Number of log-spaced bars in bar views
    pub bar_count: usize,
    /// Show the peak frequency next to the spectrum
    #[serde(default = "default_show_peak")]
    pub show_peak: bool,
}

fn default_show_peak() -> bool {
    true
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            bar_count: 48,
            show_peak: true,
        }
    }
}

/// Root settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    /// Preferred capture device name; `None` means system default
    #[serde(default)]
    pub input_device: Option<String>,
    #[serde(default)]
    pub display: DisplaySettings,
    /// When these settings were last written
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            input_device: None,
            display: DisplaySettings::default(),
            saved_at: None,
        }
    }
}

impl AnalyzerSettings {
    /// Load settings from disk, or return default if missing/corrupt
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from `path`, or return default if missing/corrupt
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::File::open(path) {
                Ok(file) => match serde_json::from_reader::<_, Self>(file) {
                    Ok(settings) => match settings.analyzer.validate() {
                        Ok(()) => {
                            info!("Settings loaded from {:?}", path);
                            return settings;
                        }
                        Err(e) => error!("Stored analyzer config is invalid: {}", e),
                    },
                    Err(e) => {
                        error!("Failed to parse settings file: {}", e);
                    }
                },
                Err(e) => {
                    error!("Failed to open settings file: {}", e);
                }
            }
        }

        info!("Using default settings");
        Self::default()
    }

    /// Save settings to disk
    pub fn save(&mut self) -> Result<(), String> {
        let path = Self::config_path().ok_or("Could not determine config path")?;
        self.save_to(&path)
    }

    /// Save settings to `path`, stamping `saved_at`
    pub fn save_to(&mut self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        self.saved_at = Some(Utc::now());
        let file = fs::File::create(path).map_err(|e| e.to_string())?;
        serde_json::to_writer_pretty(file, self).map_err(|e| e.to_string())?;

        info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Get the platform-specific configuration file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "devscope", "devscope")
            .map(|proj| proj.config_dir().join("settings.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("devscope-test-{}-{}", std::process::id(), name))
            .join("settings.json")
    }

    #[test]
    fn test_default_settings() {
        let settings = AnalyzerSettings::default();
        assert_eq!(settings.analyzer, AnalyzerConfig::default());
        assert!(settings.input_device.is_none());
        assert_eq!(settings.display.bar_count, 48);
        assert!(settings.saved_at.is_none());
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let settings = AnalyzerSettings {
            analyzer: AnalyzerConfig::compact(),
            input_device: Some("USB Microphone".to_string()),
            display: DisplaySettings {
                bar_count: 32,
                show_peak: false,
            },
            saved_at: Some(Utc::now()),
        };

        let json = serde_json::to_string_pretty(&settings).unwrap();
        let deserialized: AnalyzerSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, settings);
    }

    #[test]
    fn test_settings_missing_fields() {
        let json = r#"{ "input_device": "Line In", "display": { "bar_count": 16 } }"#;
        let settings: AnalyzerSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.input_device.as_deref(), Some("Line In"));
        assert_eq!(settings.display.bar_count, 16);
        assert!(settings.display.show_peak);
        assert_eq!(settings.analyzer, AnalyzerConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let mut settings = AnalyzerSettings {
            input_device: Some("Line In".to_string()),
            ..Default::default()
        };

        settings.save_to(&path).unwrap();
        assert!(settings.saved_at.is_some());

        let loaded = AnalyzerSettings::load_from(&path);
        assert_eq!(loaded, settings);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let loaded = AnalyzerSettings::load_from(&temp_path("missing"));
        assert_eq!(loaded, AnalyzerSettings::default());
    }

    #[test]
    fn test_load_corrupt_file_defaults() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(AnalyzerSettings::load_from(&path), AnalyzerSettings::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_invalid_config_defaults() {
        let path = temp_path("invalid");
        let mut settings = AnalyzerSettings::default();
        settings.analyzer.frame_size = 1000;
        settings.save_to(&path).unwrap();

        assert_eq!(AnalyzerSettings::load_from(&path), AnalyzerSettings::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
