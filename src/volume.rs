//! Output volume
//!
//! Scripts set volume on a 0-256 scale; commands carry 0-100 (tones) or the
//! driver's coarse 1-4 band (sample playback).

use std::sync::atomic::{AtomicU8, Ordering};

/// Upper end of the caller-facing volume scale
pub const VOLUME_INPUT_MAX: i32 = 256;

/// Current output volume in percent, shared across threads
#[derive(Debug)]
pub struct Volume {
    percent: AtomicU8,
}

impl Volume {
    /// Create with an initial percentage (clamped to 100)
    pub fn new(percent: u8) -> Self {
        Volume {
            percent: AtomicU8::new(percent.min(100)),
        }
    }

    /// Map a 0-256 level linearly onto 0-100, saturating outside that range
    pub fn scale(level: i32) -> u8 {
        let percent = i64::from(level) * 100 / i64::from(VOLUME_INPUT_MAX);
        percent.clamp(0, 100) as u8
    }

    /// Set from the caller-facing 0-256 scale
    pub fn set_level(&self, level: i32) {
        let percent = Self::scale(level);
        self.percent.store(percent, Ordering::Relaxed);
        log::debug!("volume set to {}% (level {})", percent, level);
    }

    /// Current volume percentage
    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    /// Driver volume band (1-4) used by play commands
    pub fn band(&self) -> u8 {
        Self::band_for(self.percent())
    }

    /// Band for a given percentage
    pub fn band_for(percent: u8) -> u8 {
        percent / 33 + 1
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_VOLUME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_reference_points() {
        assert_eq!(Volume::scale(256), 100);
        assert_eq!(Volume::scale(128), 50);
        assert_eq!(Volume::scale(0), 0);
    }

    #[test]
    fn test_scale_saturates() {
        assert_eq!(Volume::scale(-5), 0);
        assert_eq!(Volume::scale(1000), 100);
        assert_eq!(Volume::scale(i32::MAX), 100);
        assert_eq!(Volume::scale(i32::MIN), 0);
    }

    #[test]
    fn test_scale_is_monotonic() {
        let mut previous = 0;
        for level in 0..=256 {
            let percent = Volume::scale(level);
            assert!(percent >= previous, "level {} went backwards", level);
            previous = percent;
        }
    }

    #[test]
    fn test_bands() {
        assert_eq!(Volume::band_for(0), 1);
        assert_eq!(Volume::band_for(32), 1);
        assert_eq!(Volume::band_for(33), 2);
        assert_eq!(Volume::band_for(66), 3);
        assert_eq!(Volume::band_for(100), 4);
    }

    #[test]
    fn test_default_is_audible() {
        let volume = Volume::default();
        assert!(volume.percent() > 0);
        volume.set_level(256);
        assert_eq!(volume.percent(), 100);
        assert_eq!(volume.band(), 4);
    }
}
