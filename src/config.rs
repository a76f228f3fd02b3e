// config.rs

use crate::cli::Args;
use crate::control::ControlBinding;
use crate::state::DEFAULT_BPM;
use config::{Config, File, FileFormat};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "midi_clock_config.json";
pub const MAX_CHANNEL: u8 = 15;
pub const MAX_CONTROLLER: u8 = 127;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("could not write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Session settings as stored in the JSON config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// CC number whose value 0 starts and 1 stops the clock.
    pub clock_control_cc: u8,
    /// CC number whose full press (127) counts as a tap.
    pub tap_cc: u8,
    /// Zero-based MIDI channel.
    pub channel: u8,
    pub warmup_ms: u64,
    pub bpm: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clock_control_cc: 20,
            tap_cc: 21,
            channel: 0,
            warmup_ms: 1000,
            bpm: DEFAULT_BPM,
        }
    }
}

impl Settings {
    /// Reads `path` on top of the defaults. A missing file is fine.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        debug!("Loading settings from {}", path.display());
        let loaded = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json).required(false))
            .build()?;
        let settings: Settings = loaded.try_deserialize()?;

        if path.exists() {
            info!("Loaded config from {}", path.display());
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Command-line values win over whatever the file said.
    pub fn apply_overrides(&mut self, args: &Args) {
        if let Some(cc) = args.clock_control_cc {
            self.clock_control_cc = cc;
        }
        if let Some(cc) = args.tap_cc {
            self.tap_cc = cc;
        }
        if let Some(channel) = args.channel {
            self.channel = channel;
        }
        if let Some(bpm) = args.bpm {
            self.bpm = bpm;
        }
        if let Some(warmup_ms) = args.warmup_ms {
            self.warmup_ms = warmup_ms;
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.channel > MAX_CHANNEL {
            return Err(SettingsError::Invalid(format!(
                "channel {} is out of range 0-{}",
                self.channel, MAX_CHANNEL
            )));
        }
        for (name, cc) in [("clock_control_cc", self.clock_control_cc), ("tap_cc", self.tap_cc)] {
            if cc > MAX_CONTROLLER {
                return Err(SettingsError::Invalid(format!(
                    "{} {} is out of range 0-{}",
                    name, cc, MAX_CONTROLLER
                )));
            }
        }
        if self.clock_control_cc == self.tap_cc {
            warn!(
                "clock_control_cc and tap_cc are both {}; tap tempo is unreachable",
                self.tap_cc
            );
        }
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "bpm must be greater than 0, got {}",
                self.bpm
            )));
        }
        Ok(())
    }

    pub fn binding(&self) -> ControlBinding {
        ControlBinding {
            channel: self.channel,
            transport_cc: self.clock_control_cc,
            tap_cc: self.tap_cc,
        }
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.binding(),
            ControlBinding {
                channel: 0,
                transport_cc: 20,
                tap_cc: 21
            }
        );
    }

    #[test]
    fn test_accepts_same_controller_twice() {
        let settings = Settings {
            tap_cc: 20,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_channel() {
        let settings = Settings {
            channel: 16,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }
}
