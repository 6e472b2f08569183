//! Sound device access
//!
//! The driver is talked to in two ways:
//! - command frames written with a fresh open/write/close per command
//! - a single memory-mapped status byte the hardware raises while busy
//!
//! Both sit behind traits so the playback logic can run against fakes.

pub mod lms;
pub mod protocol;

pub use lms::{LmsDevice, MappedStatus};
pub use protocol::{CommandKind, ServiceChunk, SoundCommand, MAX_CHUNK_PAYLOAD, MAX_WRITE_LEN};

use crate::Result;
use std::sync::Arc;

/// Sink for command frames
pub trait SoundDevice: Send + Sync {
    /// Write one frame, returning the byte count the write reported.
    ///
    /// Short writes are not retried.
    fn write_command(&self, frame: &[u8]) -> Result<usize>;

    /// Encode and write a command
    fn send(&self, command: &SoundCommand) -> Result<usize> {
        self.write_command(&command.encode())
    }
}

/// Hardware busy flag
pub trait BusyStatus: Send + Sync {
    /// True while the device is still rendering audio
    fn is_busy(&self) -> bool;

    /// Raise the flag ahead of a stream; the hardware clears it when done
    fn mark_busy(&self);
}

/// Maps the busy status byte on first playback
pub trait StatusOpener: Send + Sync {
    /// Open (map) the status byte
    fn open_status(&self) -> Result<Arc<dyn BusyStatus>>;
}

/// Send a command, dropping it with a log line if the device refuses.
///
/// Returns the reported byte count when the write went through.
pub(crate) fn send_best_effort(device: &dyn SoundDevice, command: &SoundCommand) -> Option<usize> {
    match device.send(command) {
        Ok(written) => Some(written),
        Err(e) => {
            log::warn!("dropping {:?} command: {}", command.kind(), e);
            None
        }
    }
}
