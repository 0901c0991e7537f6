//! RCON packet codec
//!
//! Wire layout, all integers little endian:
//!
//! ```text
//! | size: i32 | id: i32 | type: i32 | body ... | 0x00 | 0x00 |
//! ```
//!
//! `size` counts every byte after itself, so an empty body gives 10.
//! Replies can arrive split across several reads (or several packets in
//! one read); `PacketDecoder` buffers bytes until a whole frame is present.

use crate::core::ProtocolError;

/// Client → server: authenticate with the body as password
pub const PACKET_AUTH: i32 = 3;
/// Server → client: handshake result, id is -1 on failure
pub const PACKET_AUTH_RESPONSE: i32 = 2;
/// Client → server: run the body as a console command
pub const PACKET_EXEC_COMMAND: i32 = 2;
/// Server → client: command output
pub const PACKET_RESPONSE_VALUE: i32 = 0;

/// Request id the server answers a rejected handshake with
pub const AUTH_FAILED_ID: i32 = -1;

/// id + type + two NUL terminators
pub const MIN_PACKET_SIZE: usize = 10;

const SIZE_FIELD_LEN: usize = 4;

/// One decoded RCON packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: Vec<u8>,
}

impl Packet {
    pub fn new(id: i32, kind: i32, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    /// Serialize including the leading size field
    pub fn encode(&self) -> Vec<u8> {
        let size = self.body.len() + MIN_PACKET_SIZE;
        let mut buf = Vec::with_capacity(SIZE_FIELD_LEN + size);
        buf.extend_from_slice(&(size as i32).to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.extend_from_slice(&self.body);
        buf.extend_from_slice(&[0, 0]);
        buf
    }
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Reassembles length-framed packets from a byte stream
#[derive(Debug)]
pub struct PacketDecoder {
    buf: Vec<u8>,
    max_packet_size: usize,
}

impl PacketDecoder {
    pub fn new(max_packet_size: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_packet_size,
        }
    }

    /// Append bytes read from the socket
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes received but not yet consumed by a whole packet
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete packet, if one is buffered
    ///
    /// A size field outside `[MIN_PACKET_SIZE, max_packet_size]` or a body
    /// without its NUL terminators is unrecoverable for the stream.
    pub fn decode(&mut self) -> Result<Option<Packet>, ProtocolError> {
        if self.buf.len() < SIZE_FIELD_LEN {
            return Ok(None);
        }

        let size = read_i32(&self.buf, 0);
        if size < MIN_PACKET_SIZE as i32 {
            return Err(ProtocolError::framing(format!(
                "packet size {} below minimum {}",
                size, MIN_PACKET_SIZE
            )));
        }
        let size = size as usize;
        if size > self.max_packet_size {
            return Err(ProtocolError::framing(format!(
                "packet size {} exceeds limit {}",
                size, self.max_packet_size
            )));
        }

        let total = SIZE_FIELD_LEN + size;
        if self.buf.len() < total {
            return Ok(None);
        }

        let frame: Vec<u8> = self.buf.drain(..total).collect();
        let id = read_i32(&frame, 4);
        let kind = read_i32(&frame, 8);
        let payload = &frame[12..];

        if payload[payload.len() - 2..] != [0, 0] {
            return Err(ProtocolError::framing(format!(
                "packet {} body is not NUL terminated",
                id
            )));
        }

        Ok(Some(Packet {
            id,
            kind,
            body: payload[..payload.len() - 2].to_vec(),
        }))
    }
}
