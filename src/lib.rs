//! Sound core for the EV3 `lms_sound` character device
//!
//! Drives the brick's sound peripheral through its command device: direct
//! tones, sampled WAV buffers streamed in bounded chunks by a background
//! pump, and a blocking "play and wait" call that only returns once the
//! hardware reports it has finished rendering.
//!
//! # Components
//! - [`device`]: command framing and the `/dev/lms_sound` channel
//! - [`synth`]: direct tones and one-cycle low-frequency waveforms
//! - [`playback`]: the sample pump worker and the blocking coordinator
//! - [`system`]: the process-wide facade wiring everything together
//!
//! # Quick start
//! ```no_run
//! use lms_sound::{SampleBuffer, SoundSystem};
//!
//! let sound = SoundSystem::global();
//! sound.set_volume(128);
//! sound.play_tone(440, 250);
//!
//! let wav = std::fs::read("beep.wav").unwrap();
//! let buffer = SampleBuffer::from_wav(wav).unwrap();
//! sound.play(&buffer).unwrap();
//! ```

#![warn(missing_docs)]

pub mod buffer; // Shared sample buffers
pub mod config; // Runtime configuration
pub mod device; // Device protocol and channel
pub mod playback; // Sample pump + coordinator
pub mod synth; // Tone synthesis
pub mod system; // Process-wide facade
pub mod volume; // Volume scaling

/// Error types for sound core operations
#[derive(thiserror::Error, Debug)]
pub enum SoundError {
    /// Sound device could not be opened, written or mapped
    #[error("Sound device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Sample buffer is too short to carry a WAV header
    #[error("Malformed sample buffer: {0}")]
    MalformedBuffer(String),

    /// Command frame could not be decoded
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Error building a WAV payload
    #[error("Audio encode error: {0}")]
    EncodeError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for SoundError {
    /// Converts a String into `SoundError::Other`.
    ///
    /// Prefer the specific variants (`DeviceUnavailable`, `MalformedBuffer`,
    /// `ConfigError`) where the failure has a known cause.
    fn from(msg: String) -> Self {
        SoundError::Other(msg)
    }
}

impl From<&str> for SoundError {
    /// Converts a string slice into `SoundError::Other`.
    fn from(msg: &str) -> Self {
        SoundError::Other(msg.to_string())
    }
}

/// Result type for sound core operations
pub type Result<T> = std::result::Result<T, SoundError>;

// Public API exports
pub use buffer::{SampleBuffer, Sound, WAV_HEADER_LEN};
pub use config::SoundConfig;
pub use device::{
    BusyStatus, CommandKind, LmsDevice, MappedStatus, SoundCommand, SoundDevice, StatusOpener,
};
pub use playback::{NoHooks, PlaybackCoordinator, PlaybackHooks};
pub use synth::{freq_to_wav, Delay, ThreadDelay, ToneSynth};
pub use system::SoundSystem;
pub use volume::Volume;
