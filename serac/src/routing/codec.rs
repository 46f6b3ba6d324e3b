// Serac: Distributed Distance-Vector Routing
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module implementing the wire framing.
//!
//! A frame is a 4-byte big-endian length prefix followed by the JSON encoding of one
//! [`Message`]. The length covers only the body. Frames above [`MAX_FRAME_LEN`] are rejected
//! on both sides, so a maximum-length packet always fits in one short read.

use crate::routing::message::Message;

use std::convert::TryFrom;
use std::io::{Read, Write};
use thiserror::Error;

/// Upper bound on the body length of one frame.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Encode a message into a complete frame (length prefix included).
pub fn encode(msg: &Message) -> Result<Vec<u8>, WireError> {
    let body = serde_json::to_vec(msg)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(body.len()));
    }
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decode a message from the body of a frame (length prefix already stripped).
pub fn decode(body: &[u8]) -> Result<Message, WireError> {
    if body.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(body.len()));
    }
    Ok(serde_json::from_slice(body)?)
}

/// Write one framed message to the given writer.
pub fn write_message<W: Write>(w: &mut W, msg: &Message) -> Result<(), WireError> {
    let frame = encode(msg)?;
    w.write_all(&frame)?;
    w.flush()?;
    Ok(())
}

/// Read one framed message from the given reader.
pub fn read_message<R: Read>(r: &mut R) -> Result<Message, WireError> {
    let mut prefix = [0u8; 4];
    r.read_exact(&mut prefix)?;
    let len = usize::try_from(u32::from_be_bytes(prefix)).unwrap_or(usize::MAX);
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(len));
    }
    let mut body = vec![0u8; len];
    r.read_exact(&mut body)?;
    decode(&body)
}

/// Wire protocol errors. Every variant reduces to "message dropped" at the receiver, and to a
/// dropped send at the sender.
#[derive(Debug, Error)]
pub enum WireError {
    /// The underlying stream failed (connect refused, timeout, broken pipe, short read)
    #[error("Stream error: {0}")]
    IoError(#[from] std::io::Error),
    /// The payload is not a valid message encoding
    #[error("Invalid message encoding: {0}")]
    CodecError(#[from] serde_json::Error),
    /// The declared frame length exceeds [`MAX_FRAME_LEN`]
    #[error("Frame of {0} bytes exceeds the maximum frame length")]
    FrameTooLarge(usize),
}
