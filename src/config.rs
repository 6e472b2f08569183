//! Sound core configuration
//!
//! Everything the brick firmware hard-wires (device node, pump period, note
//! spacing) lives here so tests and alternative boards can override it.

use crate::{Result, SoundError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Device node exposed by the EV3 sound driver
pub const DEFAULT_DEVICE_PATH: &str = "/dev/lms_sound";
/// Sample rate the sound driver plays PCM at
pub const DEFAULT_SAMPLE_RATE: u32 = 8000;
/// Period of the sample pump worker
pub const DEFAULT_PUMP_INTERVAL_MS: u64 = 10;
/// Rest appended after each note so consecutive notes stay distinct
pub const NOTE_PAUSE_MS: u32 = 20;
/// Below this frequency the hardware tone generator is unreliable
pub const LOW_FREQUENCY_THRESHOLD_HZ: i32 = 300;
/// Pause after every tone call so the device latches the command
pub const LATCH_DELAY_MS: u32 = 1;
/// Volume used before anything calls `set_volume`
pub const DEFAULT_VOLUME: u8 = 2;
/// Upper bound accepted for the note pause and latch delay
pub const MAX_CONFIG_DELAY_MS: u32 = 60_000;

/// Runtime configuration for the sound core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Character device receiving commands and carrying the status byte
    pub device_path: PathBuf,
    /// Sample rate for synthesized waveforms (Hz)
    pub sample_rate: u32,
    /// Sample pump tick period (ms)
    pub pump_interval_ms: u64,
    /// Silent rest carved out of each timed note (ms)
    pub note_pause_ms: u32,
    /// Frequencies below this get a synthesized one-cycle waveform (Hz)
    pub low_frequency_threshold_hz: i32,
    /// Delay after each tone command (ms)
    pub latch_delay_ms: u32,
    /// Initial volume (0-100)
    pub default_volume: u8,
}

impl Default for SoundConfig {
    fn default() -> Self {
        SoundConfig {
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
            sample_rate: DEFAULT_SAMPLE_RATE,
            pump_interval_ms: DEFAULT_PUMP_INTERVAL_MS,
            note_pause_ms: NOTE_PAUSE_MS,
            low_frequency_threshold_hz: LOW_FREQUENCY_THRESHOLD_HZ,
            latch_delay_ms: LATCH_DELAY_MS,
            default_volume: DEFAULT_VOLUME,
        }
    }
}

impl SoundConfig {
    /// Default configuration targeting a different device node
    pub fn with_device(path: impl Into<PathBuf>) -> Self {
        SoundConfig {
            device_path: path.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields fall back to defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SoundConfig = serde_json::from_str(json)
            .map_err(|e| SoundError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SoundError::ConfigError(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(SoundError::ConfigError("sample_rate must be non-zero".into()));
        }
        if self.pump_interval_ms == 0 {
            return Err(SoundError::ConfigError(
                "pump_interval_ms must be non-zero".into(),
            ));
        }
        for (name, value) in [
            ("note_pause_ms", self.note_pause_ms),
            ("latch_delay_ms", self.latch_delay_ms),
        ] {
            if value > MAX_CONFIG_DELAY_MS {
                return Err(SoundError::ConfigError(format!(
                    "{} {} exceeds {}",
                    name, value, MAX_CONFIG_DELAY_MS
                )));
            }
        }
        if self.low_frequency_threshold_hz < 0
            || i64::from(self.low_frequency_threshold_hz) > i64::from(self.sample_rate)
        {
            return Err(SoundError::ConfigError(format!(
                "low_frequency_threshold_hz {} outside 0..={}",
                self.low_frequency_threshold_hz, self.sample_rate
            )));
        }
        if self.default_volume > 100 {
            return Err(SoundError::ConfigError(format!(
                "default_volume {} exceeds 100",
                self.default_volume
            )));
        }
        Ok(())
    }

    /// Pump tick period as a `Duration`
    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms)
    }
}
