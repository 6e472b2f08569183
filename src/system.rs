//! Process-wide sound system
//!
//! Bundles volume, tone synthesis and sample playback over one device. The
//! runtime normally goes through [`SoundSystem::global`], which targets the
//! real driver and is built on first use.

use crate::buffer::SampleBuffer;
use crate::config::SoundConfig;
use crate::device::{LmsDevice, SoundDevice, StatusOpener};
use crate::playback::{NoHooks, PlaybackCoordinator, PlaybackHooks};
use crate::synth::{Delay, ThreadDelay, ToneSynth};
use crate::volume::Volume;
use crate::Result;
use std::sync::{Arc, OnceLock};

/// Environment variable naming a JSON config file for [`SoundSystem::global`]
pub const CONFIG_ENV_VAR: &str = "LMS_SOUND_CONFIG";

static GLOBAL: OnceLock<SoundSystem> = OnceLock::new();

/// Volume, tones and sample playback for one sound device
pub struct SoundSystem {
    config: SoundConfig,
    volume: Arc<Volume>,
    synth: ToneSynth,
    playback: PlaybackCoordinator,
}

impl SoundSystem {
    /// Sound system on the device node named by `config`
    pub fn new(config: SoundConfig) -> Self {
        let device = Arc::new(LmsDevice::new(&config.device_path));
        Self::with_backend(
            config,
            device.clone(),
            device,
            Arc::new(NoHooks),
            Arc::new(ThreadDelay),
        )
    }

    /// Sound system over explicit collaborators
    pub fn with_backend(
        config: SoundConfig,
        device: Arc<dyn SoundDevice>,
        status_opener: Arc<dyn StatusOpener>,
        hooks: Arc<dyn PlaybackHooks>,
        delay: Arc<dyn Delay>,
    ) -> Self {
        let volume = Arc::new(Volume::new(config.default_volume));
        let synth = ToneSynth::new(&config, device.clone(), volume.clone(), delay);
        let playback =
            PlaybackCoordinator::new(&config, device, status_opener, volume.clone(), hooks);
        SoundSystem {
            config,
            volume,
            synth,
            playback,
        }
    }

    /// The shared instance, created on first call.
    ///
    /// Reads the JSON file named by `LMS_SOUND_CONFIG` when set, falling
    /// back to the built-in defaults if it is missing or invalid.
    pub fn global() -> &'static SoundSystem {
        GLOBAL.get_or_init(|| Self::new(Self::load_global_config()))
    }

    fn load_global_config() -> SoundConfig {
        let Ok(path) = std::env::var(CONFIG_ENV_VAR) else {
            return SoundConfig::default();
        };
        match SoundConfig::from_json_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring sound config '{}': {}", path, e);
                SoundConfig::default()
            }
        }
    }

    /// Set volume on the 0-256 scale (saturating)
    pub fn set_volume(&self, level: i32) {
        self.volume.set_level(level);
    }

    /// Current volume percentage (0-100)
    pub fn volume(&self) -> u8 {
        self.volume.percent()
    }

    /// Play a tone and block for its duration; see [`ToneSynth::play_tone`]
    pub fn play_tone(&self, frequency_hz: i32, duration_ms: i32) -> Option<SampleBuffer> {
        self.synth.play_tone(frequency_hz, duration_ms)
    }

    /// Silence the output
    pub fn stop(&self) {
        self.synth.stop();
    }

    /// Play a sample buffer and block until the hardware is done
    pub fn play(&self, buffer: &SampleBuffer) -> Result<()> {
        self.playback.play(buffer)
    }

    /// Tone synthesizer
    pub fn synth(&self) -> &ToneSynth {
        &self.synth
    }

    /// Sample playback coordinator
    pub fn playback(&self) -> &PlaybackCoordinator {
        &self.playback
    }

    /// Active configuration
    pub fn config(&self) -> &SoundConfig {
        &self.config
    }
}
