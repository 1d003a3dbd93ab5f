/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Tokio codec for length-prefixed command framing.
//!
//! Wire format of one frame:
//!
//! ```text
//! [ length: u32 BE ][ command: i32 BE ][ body ... ]
//! ```
//!
//! `length` counts the whole frame, header included, so the minimum legal
//! value is [`HEADER_LEN`]. A heartbeat is a bare header with command `0` and
//! an empty body.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use relink_core::{CommandId, ProtocolCodec};
use thiserror::Error;
use tokio_util::codec::Decoder;

/// Bytes occupied by the length and command fields.
pub const HEADER_LEN: usize = 8;

/// Errors that can occur during codec operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Declared frame length smaller than the header itself.
    #[error("invalid frame length: declared {declared} bytes, header alone is {HEADER_LEN}")]
    InvalidLength {
        /// Declared length field value.
        declared: usize,
    },

    /// Frame exceeds maximum size.
    #[error("frame too large: {size} bytes exceeds maximum {max_size}")]
    FrameTooLarge {
        /// Declared frame size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Builds a complete frame from a command and a body.
#[must_use]
pub fn frame(cmd: CommandId, body: &[u8]) -> Bytes {
    let total = HEADER_LEN + body.len();
    let mut buf = BytesMut::with_capacity(total);
    buf.put_u32(total as u32);
    buf.put_i32(cmd.value());
    buf.put_slice(body);
    buf.freeze()
}

/// Returns the body of a frame, without the header.
///
/// An undersized payload yields an empty body.
#[must_use]
pub fn body(payload: &Bytes) -> Bytes {
    if payload.len() < HEADER_LEN {
        return Bytes::new();
    }
    payload.slice(HEADER_LEN..)
}

/// Tokio codec extracting whole frames from a TCP byte stream.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Maximum frame size in bytes.
    max_frame_size: usize,
}

impl FrameCodec {
    /// Creates a new codec with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_frame_size: 1024 * 1024, // 1MB
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let declared = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if declared < HEADER_LEN {
            return Err(CodecError::InvalidLength { declared });
        }
        if declared > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                size: declared,
                max_size: self.max_frame_size,
            });
        }

        if src.len() < declared {
            src.reserve(declared - src.len());
            return Ok(None);
        }

        Ok(Some(src.split_to(declared)))
    }
}

/// Protocol-knowledge adapter for the length-prefixed command format.
///
/// Gives the session layer everything it asks about a frame: header size,
/// a ready heartbeat, header validation, and command extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCodec;

impl CommandCodec {
    /// Creates the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProtocolCodec for CommandCodec {
    fn header_len(&self) -> usize {
        HEADER_LEN
    }

    fn heartbeat(&self) -> Bytes {
        frame(CommandId::NONE, &[])
    }

    fn validate_header(&self, payload: &Bytes) -> bool {
        if payload.len() < HEADER_LEN {
            return false;
        }
        let declared = (&payload[0..4]).get_u32() as usize;
        declared == payload.len()
    }

    fn response_command(&self, payload: &Bytes) -> CommandId {
        if payload.len() < HEADER_LEN {
            return CommandId::NONE;
        }
        CommandId::new((&payload[4..8]).get_i32())
    }
}
