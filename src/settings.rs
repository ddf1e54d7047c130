//! Game settings with persistence
//!
//! Settings are read from `~/.config/pong/settings.toml`

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All game settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub scene: SceneSettings,
    pub simulation: SimulationSettings,
}

impl GameSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pong"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                warn!("Failed to parse settings: {}, using defaults", e);
                Self::default()
            }),
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Parse settings from TOML text. Missing keys keep their defaults.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Which scene description to load
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Path of the JSON scene description
    pub path: PathBuf,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/scenes/pong.json"),
        }
    }
}

/// Fixed-step frame loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Number of frames to simulate before exiting
    pub frames: u32,
    /// Seconds advanced per frame
    pub frame_dt: f32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            frames: 600,
            frame_dt: 1.0 / 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = GameSettings::parse("[simulation]\nframes = 10\n").unwrap();
        assert_eq!(settings.simulation.frames, 10);
        assert_eq!(settings.simulation.frame_dt, 1.0 / 60.0);
        assert_eq!(settings.scene.path, PathBuf::from("assets/scenes/pong.json"));
    }

    #[test]
    fn serialized_settings_parse_back() {
        let mut settings = GameSettings::default();
        settings.scene.path = PathBuf::from("levels/practice.json");
        let text = toml::to_string_pretty(&settings).unwrap();

        let parsed = GameSettings::parse(&text).unwrap();
        assert_eq!(parsed.scene.path, settings.scene.path);
        assert_eq!(parsed.simulation.frames, settings.simulation.frames);
    }

    #[test]
    fn invalid_file_is_an_error() {
        assert!(GameSettings::parse("[simulation]\nframes = \"many\"\n").is_err());
    }
}
