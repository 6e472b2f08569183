//! Shared sample buffers
//!
//! A [`SampleBuffer`] is an immutable WAV-shaped byte sequence. Cloning
//! takes another reference; the bytes live as long as the longest holder,
//! which lets the pump worker keep streaming after the caller drops theirs.

use crate::system::SoundSystem;
use crate::{Result, SoundError};
use std::io::Cursor;
use std::sync::Arc;

/// Bytes skipped before streaming a buffer
pub const WAV_HEADER_LEN: usize = 44;

/// Reference-counted, read-only WAV bytes
#[derive(Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    data: Arc<[u8]>,
}

impl SampleBuffer {
    /// Adopt WAV bytes. Header fields are not inspected, only its length.
    pub fn from_wav(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() < WAV_HEADER_LEN {
            return Err(SoundError::MalformedBuffer(format!(
                "{} bytes is shorter than the {}-byte WAV header",
                bytes.len(),
                WAV_HEADER_LEN
            )));
        }
        Ok(Self::from_raw(bytes))
    }

    pub(crate) fn from_raw(bytes: Vec<u8>) -> Self {
        SampleBuffer { data: bytes.into() }
    }

    /// Encode unsigned 8-bit mono PCM (the driver's native format) as WAV
    pub fn from_pcm_u8(samples: &[u8], sample_rate: u32) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 8,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + samples.len()));
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| SoundError::EncodeError(format!("Failed to start WAV: {}", e)))?;

        // hound stores 8-bit samples signed and re-biases them on write
        for &sample in samples {
            writer
                .write_sample((i16::from(sample) - 128) as i8)
                .map_err(|e| SoundError::EncodeError(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| SoundError::EncodeError(format!("Failed to finalize WAV: {}", e)))?;

        Self::from_wav(cursor.into_inner())
    }

    /// All bytes, header included
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Bytes after the header
    pub fn payload(&self) -> &[u8] {
        self.data.get(WAV_HEADER_LEN..).unwrap_or(&[])
    }

    /// Total length including header
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the buffer holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of live references to these bytes
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}

impl std::fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("len", &self.data.len())
            .field("holders", &self.holders())
            .finish()
    }
}

/// A playable sound bound to a WAV buffer
#[derive(Debug, Clone)]
pub struct Sound {
    buffer: SampleBuffer,
}

impl Sound {
    /// Bind a sound to `buffer`, taking a reference
    pub fn from_wav(buffer: &SampleBuffer) -> Self {
        Sound {
            buffer: buffer.clone(),
        }
    }

    /// Another reference to the underlying buffer
    pub fn buffer(&self) -> SampleBuffer {
        self.buffer.clone()
    }

    /// Play on the process-wide sound system and wait for it to finish
    pub fn play(&self) -> Result<()> {
        self.play_on(SoundSystem::global())
    }

    /// Play on a specific sound system and wait for it to finish
    pub fn play_on(&self, system: &SoundSystem) -> Result<()> {
        system.play(&self.buffer)
    }
}
