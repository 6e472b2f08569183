//! Sample pump
//!
//! One detached worker ticks at a fixed period and, under the playback lock,
//! moves the next chunk of the active buffer to the device. Completion is
//! two-phase: the buffer drains first, then the hardware busy flag has to
//! drop before waiters are released, since the driver keeps playing what it
//! has already been handed.

use super::Shared;
use crate::buffer::SampleBuffer;
use crate::device::{BusyStatus, ServiceChunk, SoundDevice, MAX_CHUNK_PAYLOAD};
use crate::Result;
use parking_lot::Condvar;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

/// Playback state guarded by the coordinator's lock
#[derive(Default)]
pub(crate) struct PlaybackState {
    /// Buffer being streamed, if any
    pub(crate) active: Option<SampleBuffer>,
    /// Next byte of `active` to send; non-zero until completion is signaled
    pub(crate) offset: usize,
    /// Hardware busy flag, mapped on first playback
    pub(crate) status: Option<Arc<dyn BusyStatus>>,
    /// Worker has been spawned
    pub(crate) pump_started: bool,
    /// Streams started so far
    pub(crate) generation: u64,
    /// Last stream generation signaled complete
    pub(crate) completed: u64,
}

impl PlaybackState {
    fn hardware_busy(&self) -> bool {
        self.status.as_ref().is_some_and(|status| status.is_busy())
    }
}

/// Run one pump step. Caller holds the playback lock.
pub(crate) fn pump_once(state: &mut PlaybackState, device: &dyn SoundDevice, done: &Condvar) {
    let Some(buffer) = state.active.as_ref() else {
        if state.offset != 0 && !state.hardware_busy() {
            log::debug!("sample stream {} finished", state.generation);
            state.offset = 0;
            state.completed = state.generation;
            done.notify_all();
        }
        return;
    };

    let start = state.offset;
    let len = buffer.len().saturating_sub(start).min(MAX_CHUNK_PAYLOAD);
    if len == 0 {
        // Drained; completion waits for the busy flag on a later tick
        state.active = None;
        return;
    }

    let chunk = ServiceChunk::from_payload(&buffer.as_bytes()[start..start + len]);
    match device.write_command(chunk.as_bytes()) {
        Ok(written) if written > 0 => state.offset += len,
        Ok(_) => log::debug!("device accepted no bytes at offset {}", start),
        Err(e) => log::debug!("chunk at offset {} dropped: {}", start, e),
    }
}

/// Start the detached pump worker.
///
/// The worker only holds a weak reference and exits on the first tick after
/// its coordinator is gone.
pub(crate) fn spawn_pump(shared: &Arc<Shared>, interval: Duration) -> Result<()> {
    let shared: Weak<Shared> = Arc::downgrade(shared);
    thread::Builder::new()
        .name("lms-sound-pump".into())
        .spawn(move || loop {
            thread::sleep(interval);
            let Some(shared) = shared.upgrade() else {
                log::debug!("sample pump stopping, coordinator dropped");
                break;
            };
            let mut state = shared.state.lock();
            pump_once(&mut state, shared.device.as_ref(), &shared.done);
        })?;
    log::info!("sample pump started ({} ms period)", interval.as_millis());
    Ok(())
}
