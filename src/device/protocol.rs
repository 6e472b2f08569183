//! lms_sound command framing
//!
//! Every write to the device is one packed little-endian command: a kind
//! byte followed by a kind-specific body.

use crate::{Result, SoundError};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Largest single write the driver accepts
pub const MAX_WRITE_LEN: usize = 250;
/// Sample bytes carried by one service chunk
pub const MAX_CHUNK_PAYLOAD: usize = MAX_WRITE_LEN - 1;
/// Size of an encoded tone command
pub const TONE_COMMAND_LEN: usize = 6;

/// Command kind byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum CommandKind {
    /// Stop whatever is sounding
    Break = 0,
    /// Play a tone on the hardware generator
    Tone = 1,
    /// Start a sample stream at a volume band
    Play = 2,
    /// Start a looping sample stream
    Repeat = 3,
    /// Carry sample bytes for the active stream
    Service = 4,
}

/// A decoded device command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundCommand {
    /// Silence the output
    Stop,
    /// Hardware tone; zero duration rings until stopped
    Tone {
        /// Volume percent (0-100)
        volume: u8,
        /// Frequency in Hz
        frequency: u16,
        /// Duration in ms
        duration: u16,
    },
    /// Begin a sample stream
    Play {
        /// Driver volume band (1-4)
        band: u8,
    },
    /// Begin a repeating sample stream
    Repeat {
        /// Driver volume band (1-4)
        band: u8,
    },
    /// Sample bytes for the active stream
    Service(ServiceChunk),
}

impl SoundCommand {
    /// Build a tone command, saturating frequency and duration to 16 bits
    pub fn tone(volume: u8, frequency: u32, duration: u32) -> Self {
        SoundCommand::Tone {
            volume: volume.min(100),
            frequency: u16::try_from(frequency).unwrap_or(u16::MAX),
            duration: u16::try_from(duration).unwrap_or(u16::MAX),
        }
    }

    /// Kind byte of this command
    pub fn kind(&self) -> CommandKind {
        match self {
            SoundCommand::Stop => CommandKind::Break,
            SoundCommand::Tone { .. } => CommandKind::Tone,
            SoundCommand::Play { .. } => CommandKind::Play,
            SoundCommand::Repeat { .. } => CommandKind::Repeat,
            SoundCommand::Service(_) => CommandKind::Service,
        }
    }

    /// Wire bytes for this command
    pub fn encode(&self) -> Vec<u8> {
        match self {
            SoundCommand::Stop => vec![CommandKind::Break as u8],
            SoundCommand::Tone {
                volume,
                frequency,
                duration,
            } => {
                let mut out = Vec::with_capacity(TONE_COMMAND_LEN);
                out.push(CommandKind::Tone as u8);
                out.push(*volume);
                out.extend_from_slice(&frequency.to_le_bytes());
                out.extend_from_slice(&duration.to_le_bytes());
                out
            }
            SoundCommand::Play { band } => vec![CommandKind::Play as u8, *band],
            SoundCommand::Repeat { band } => vec![CommandKind::Repeat as u8, *band],
            SoundCommand::Service(chunk) => chunk.as_bytes().to_vec(),
        }
    }

    /// Parse one command frame
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let (&kind_byte, body) = frame
            .split_first()
            .ok_or_else(|| SoundError::ProtocolError("empty command frame".into()))?;
        let kind = CommandKind::from_u8(kind_byte).ok_or_else(|| {
            SoundError::ProtocolError(format!("unknown command kind {}", kind_byte))
        })?;

        match kind {
            CommandKind::Break => Ok(SoundCommand::Stop),
            CommandKind::Tone => {
                if body.len() != TONE_COMMAND_LEN - 1 {
                    return Err(SoundError::ProtocolError(format!(
                        "tone body is {} bytes, expected {}",
                        body.len(),
                        TONE_COMMAND_LEN - 1
                    )));
                }
                Ok(SoundCommand::Tone {
                    volume: body[0],
                    frequency: u16::from_le_bytes([body[1], body[2]]),
                    duration: u16::from_le_bytes([body[3], body[4]]),
                })
            }
            CommandKind::Play | CommandKind::Repeat => {
                let band = *body.first().ok_or_else(|| {
                    SoundError::ProtocolError(format!("{:?} without volume band", kind))
                })?;
                Ok(if kind == CommandKind::Play {
                    SoundCommand::Play { band }
                } else {
                    SoundCommand::Repeat { band }
                })
            }
            CommandKind::Service => Ok(SoundCommand::Service(ServiceChunk::new(body)?)),
        }
    }
}

/// Stack-allocated service command: tag byte plus up to 249 sample bytes
#[derive(Clone)]
pub struct ServiceChunk {
    buf: [u8; MAX_WRITE_LEN],
    len: usize,
}

impl ServiceChunk {
    /// Frame `payload`, rejecting anything longer than one write can carry
    pub fn new(payload: &[u8]) -> Result<Self> {
        if payload.len() > MAX_CHUNK_PAYLOAD {
            return Err(SoundError::ProtocolError(format!(
                "service chunk of {} bytes exceeds {}",
                payload.len(),
                MAX_CHUNK_PAYLOAD
            )));
        }
        Ok(Self::from_payload(payload))
    }

    /// Frame as much of `payload` as fits in one write
    pub fn from_payload(payload: &[u8]) -> Self {
        let len = payload.len().min(MAX_CHUNK_PAYLOAD);
        let mut buf = [0u8; MAX_WRITE_LEN];
        buf[0] = CommandKind::Service as u8;
        buf[1..=len].copy_from_slice(&payload[..len]);
        ServiceChunk { buf, len }
    }

    /// Number of sample bytes carried
    pub fn payload_len(&self) -> usize {
        self.len
    }

    /// Sample bytes carried
    pub fn payload(&self) -> &[u8] {
        &self.buf[1..=self.len]
    }

    /// Full frame including the tag byte
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..=self.len]
    }
}

impl PartialEq for ServiceChunk {
    fn eq(&self, other: &Self) -> bool {
        self.payload() == other.payload()
    }
}

impl Eq for ServiceChunk {}

impl std::fmt::Debug for ServiceChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceChunk")
            .field("payload_len", &self.len)
            .finish()
    }
}
