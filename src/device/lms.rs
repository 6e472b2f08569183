//! `/dev/lms_sound` backed implementations

use super::{BusyStatus, SoundDevice, StatusOpener};
use crate::{Result, SoundError};
use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::OpenOptions;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

/// Command channel to the sound driver.
///
/// Holds no file handle; each command reopens the node.
#[derive(Debug, Clone)]
pub struct LmsDevice {
    path: PathBuf,
}

impl LmsDevice {
    /// Channel to the given device node
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LmsDevice { path: path.into() }
    }

    /// Device node path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for LmsDevice {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DEVICE_PATH)
    }
}

impl SoundDevice for LmsDevice {
    fn write_command(&self, frame: &[u8]) -> Result<usize> {
        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| {
                SoundError::DeviceUnavailable(format!(
                    "Failed to open '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;
        let written = file.write(frame)?;
        if written < frame.len() {
            log::debug!("short write: {} of {} bytes", written, frame.len());
        }
        Ok(written)
    }
}

impl StatusOpener for LmsDevice {
    fn open_status(&self) -> Result<Arc<dyn BusyStatus>> {
        Ok(Arc::new(MappedStatus::open(&self.path)?))
    }
}

/// Status byte mapped shared from the device node
pub struct MappedStatus {
    byte: NonNull<u8>,
}

// The mapping is a single byte written by hardware; all access is volatile.
unsafe impl Send for MappedStatus {}
unsafe impl Sync for MappedStatus {}

impl MappedStatus {
    /// Map the first byte of `path` read/write and shared
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                SoundError::DeviceUnavailable(format!(
                    "Failed to open '{}' for status mapping: {}",
                    path.display(),
                    e
                ))
            })?;

        // The mapping outlives the descriptor, which is closed on return.
        let addr = unsafe {
            mmap(
                None,
                NonZeroUsize::MIN,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &file,
                0,
            )
        }
        .map_err(|e| {
            SoundError::DeviceUnavailable(format!(
                "Failed to map status byte of '{}': {}",
                path.display(),
                e
            ))
        })?;

        log::info!("mapped sound status byte from {}", path.display());
        Ok(MappedStatus { byte: addr.cast() })
    }
}

impl BusyStatus for MappedStatus {
    fn is_busy(&self) -> bool {
        unsafe { self.byte.as_ptr().read_volatile() != 0 }
    }

    fn mark_busy(&self) {
        unsafe { self.byte.as_ptr().write_volatile(1) }
    }
}

impl Drop for MappedStatus {
    fn drop(&mut self) {
        if let Err(e) = unsafe { munmap(self.byte.cast(), 1) } {
            log::warn!("failed to unmap sound status byte: {}", e);
        }
    }
}

impl std::fmt::Debug for MappedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedStatus")
            .field("busy", &self.is_busy())
            .finish()
    }
}
