use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cipher::DEFAULT_SHIFT;
use crate::error::{Error, Result};
use crate::playback::{DEFAULT_FREQUENCY, DEFAULT_SAMPLE_RATE};
use crate::store;

const APP_DIR: &str = "morse-trainer";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Playback settings
    pub playback_speed: f32,
    pub volume: f32,
    pub tone_frequency: f32,
    pub sample_rate: u32,

    // Translator settings
    pub default_shift: i32,

    // Storage settings
    pub history_limit: usize,

    // Device settings
    pub output_device: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback_speed: 1.0,
            volume: 1.0,
            tone_frequency: DEFAULT_FREQUENCY,
            sample_rate: DEFAULT_SAMPLE_RATE,
            default_shift: DEFAULT_SHIFT,
            history_limit: 500,
            output_device: None,
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push(APP_DIR);
            path.push("settings.json");
            path
        })
    }

    /// Directory holding history, progress and scores
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|path| path.join(APP_DIR))
            .ok_or(Error::NoDataDir("data"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("Could not determine config path, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        tracing::debug!("Config path: {:?}", path);
        let settings: Self = store::load_json(path);
        settings.sanitized()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(Error::NoDataDir("config"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        store::save_json(path, self)?;
        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Clamp values a hand-edited file may have put out of range
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.playback_speed.is_finite() && self.playback_speed > 0.0) {
            tracing::warn!("Invalid playback speed {}, using {}", self.playback_speed, defaults.playback_speed);
            self.playback_speed = defaults.playback_speed;
        }
        if !(self.tone_frequency.is_finite() && self.tone_frequency > 0.0) {
            self.tone_frequency = defaults.tone_frequency;
        }
        if self.sample_rate == 0 {
            self.sample_rate = defaults.sample_rate;
        }
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            defaults.volume
        };
        self.history_limit = self.history_limit.max(1);
        self
    }
}
