use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use cadence_core::video::layout::ScaleMode;
use cadence_testcard::TestCardConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub window_width: usize,
    pub window_height: usize,
    #[serde(default)]
    pub scale_mode: ScaleMode,
    #[serde(default = "default_audio_enabled")]
    pub audio_enabled: bool,
    #[serde(default)]
    pub testcard: TestCardConfig,
}

fn default_audio_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_width: 512,
            window_height: 342,
            scale_mode: ScaleMode::default(),
            audio_enabled: true,
            testcard: TestCardConfig::default(),
        }
    }
}

impl Settings {
    /// Get the config file path relative to the executable
    pub fn config_path() -> PathBuf {
        let mut path = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("config.json");
        path
    }

    /// Load settings from config.json, falling back to defaults on error
    pub fn load() -> Self {
        let path = Self::config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("failed to parse config.json: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                // File doesn't exist or can't be read, use defaults
                Self::default()
            }
        }
    }

    /// Save settings to config.json immediately
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::config_path();
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.window_width, 512);
        assert_eq!(settings.window_height, 342);
        assert!(settings.audio_enabled);
        assert_eq!(settings.scale_mode, ScaleMode::Unscaled);
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings {
            window_width: 800,
            window_height: 480,
            scale_mode: ScaleMode::Stretch,
            audio_enabled: false,
            testcard: TestCardConfig::default(),
        };
        let json = serde_json::to_string(&settings).expect("serialize");
        let loaded: Settings = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(loaded.window_width, 800);
        assert_eq!(loaded.scale_mode, ScaleMode::Stretch);
        assert!(!loaded.audio_enabled);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        // An older config without the newer fields still loads
        let loaded: Settings =
            serde_json::from_str(r#"{"window_width": 640, "window_height": 400}"#).expect("parse");
        assert_eq!(loaded.window_width, 640);
        assert!(loaded.audio_enabled);
        assert_eq!(loaded.scale_mode, ScaleMode::Unscaled);
    }
}
