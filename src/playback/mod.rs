//! Blocking sample playback
//!
//! [`PlaybackCoordinator::play`] hands a buffer to the sample pump and
//! parks the caller on a condition variable until the pump has drained the
//! buffer and the hardware reports idle. One buffer streams at a time; a
//! second `play` replaces the one in flight.

mod pump;

use crate::buffer::{SampleBuffer, WAV_HEADER_LEN};
use crate::config::SoundConfig;
use crate::device::{send_best_effort, BusyStatus, SoundCommand, SoundDevice, StatusOpener};
use crate::volume::Volume;
use crate::Result;
use parking_lot::{Condvar, Mutex};
use pump::{pump_once, spawn_pump, PlaybackState};
use std::sync::Arc;
use std::time::Duration;

/// Callbacks around a blocking playback
///
/// The embedding runtime uses these to suspend and resume its own
/// foreground work while a sample plays.
pub trait PlaybackHooks: Send + Sync {
    /// Called before the stream is armed
    fn before_play(&self) {}

    /// Called after the stream has finished
    fn after_play(&self) {}
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl PlaybackHooks for NoHooks {}

/// State shared between callers and the pump worker
pub(crate) struct Shared {
    pub(crate) state: Mutex<PlaybackState>,
    pub(crate) done: Condvar,
    pub(crate) device: Arc<dyn SoundDevice>,
}

/// Owns the playback state and the pump worker
pub struct PlaybackCoordinator {
    shared: Arc<Shared>,
    status_opener: Arc<dyn StatusOpener>,
    volume: Arc<Volume>,
    hooks: Arc<dyn PlaybackHooks>,
    pump_interval: Duration,
}

impl PlaybackCoordinator {
    /// Create a coordinator. Nothing touches the device until the first `play`.
    pub fn new(
        config: &SoundConfig,
        device: Arc<dyn SoundDevice>,
        status_opener: Arc<dyn StatusOpener>,
        volume: Arc<Volume>,
        hooks: Arc<dyn PlaybackHooks>,
    ) -> Self {
        PlaybackCoordinator {
            shared: Arc::new(Shared {
                state: Mutex::new(PlaybackState::default()),
                done: Condvar::new(),
                device,
            }),
            status_opener,
            volume,
            hooks,
            pump_interval: config.pump_interval(),
        }
    }

    /// Stream `buffer` and block until the hardware has finished playing it.
    ///
    /// The first call maps the status byte and starts the pump worker. A
    /// call made while another buffer streams replaces that buffer; every
    /// waiter returns once the replacement completes.
    ///
    /// Fails only if the status byte cannot be mapped or the worker cannot
    /// be spawned; dropped device writes just lose sound.
    pub fn play(&self, buffer: &SampleBuffer) -> Result<()> {
        let status = {
            let mut state = self.shared.state.lock();
            let status = self.ensure_status(&mut state)?;
            self.ensure_pump(&mut state)?;
            status
        };

        self.hooks.before_play();

        let mut state = self.shared.state.lock();
        status.mark_busy();
        send_best_effort(
            self.shared.device.as_ref(),
            &SoundCommand::Play {
                band: self.volume.band(),
            },
        );
        if state.active.replace(buffer.clone()).is_some() {
            log::debug!("replacing in-flight sample stream");
        }
        state.offset = WAV_HEADER_LEN;
        state.generation += 1;
        let ticket = state.generation;
        log::debug!("sample stream {} armed ({} bytes)", ticket, buffer.len());

        pump_once(&mut state, self.shared.device.as_ref(), &self.shared.done);
        while state.completed < ticket {
            self.shared.done.wait(&mut state);
        }
        drop(state);

        self.hooks.after_play();
        Ok(())
    }

    /// True while a buffer is still being handed to the device
    pub fn is_streaming(&self) -> bool {
        self.shared.state.lock().active.is_some()
    }

    /// True once the pump worker has been started
    pub fn pump_running(&self) -> bool {
        self.shared.state.lock().pump_started
    }

    fn ensure_status(&self, state: &mut PlaybackState) -> Result<Arc<dyn BusyStatus>> {
        if let Some(status) = &state.status {
            return Ok(status.clone());
        }
        let status = self.status_opener.open_status()?;
        state.status = Some(status.clone());
        Ok(status)
    }

    fn ensure_pump(&self, state: &mut PlaybackState) -> Result<()> {
        if !state.pump_started {
            spawn_pump(&self.shared, self.pump_interval)?;
            state.pump_started = true;
        }
        Ok(())
    }
}
