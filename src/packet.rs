//! Encoding and decoding of RCON frames.
//!
//! Every frame has the same layout, with all integers as little-endian `i32`:
//!
//! ```text
//! +--------+------------+------+---------+------------+
//! | length | request id | type | payload | terminator |
//! | 4      | 4          | 4    | n       | 2          |
//! +--------+------------+------+---------+------------+
//! ```
//!
//! `length` counts everything after itself, so it is always `n + 10`.

use crate::{
    errors::RconProtocolError, SERVERDATA_AUTH, SERVERDATA_EXECCOMMAND, SERVERDATA_RESPONSE_VALUE,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::{borrow::Cow, mem::size_of};

const HEADER_LEN: usize = size_of::<i32>() * 3;
const TERMINATOR: [u8; 2] = [0, 0];

/// Type of an RCON packet.
///
/// Values other than the known constants are carried as [`RconPacketType::Other`]
/// and sent to the server unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RconPacketType {
    /// `SERVERDATA_RESPONSE_VALUE` (0).
    ResponseValue,
    /// `SERVERDATA_EXECCOMMAND` (2). Also the type of an auth response.
    ExecCommand,
    /// `SERVERDATA_AUTH` (3).
    Auth,
    /// Any other type value.
    Other(i32),
}

impl From<RconPacketType> for i32 {
    fn from(packet_type: RconPacketType) -> Self {
        match packet_type {
            RconPacketType::ResponseValue => SERVERDATA_RESPONSE_VALUE,
            RconPacketType::ExecCommand => SERVERDATA_EXECCOMMAND,
            RconPacketType::Auth => SERVERDATA_AUTH,
            RconPacketType::Other(value) => value,
        }
    }
}

impl From<i32> for RconPacketType {
    fn from(value: i32) -> Self {
        match value {
            SERVERDATA_RESPONSE_VALUE => RconPacketType::ResponseValue,
            SERVERDATA_EXECCOMMAND => RconPacketType::ExecCommand,
            SERVERDATA_AUTH => RconPacketType::Auth,
            other => RconPacketType::Other(other),
        }
    }
}

/// An outgoing RCON packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RconPacket {
    /// Request id, fixed per session.
    pub request_id: i32,
    /// Type of the request.
    pub packet_type: RconPacketType,
    /// Raw payload bytes, without terminator.
    pub payload: Bytes,
}

impl RconPacket {
    /// Build a packet.
    pub fn new(request_id: i32, packet_type: RconPacketType, payload: impl Into<Bytes>) -> Self {
        Self {
            request_id,
            packet_type,
            payload: payload.into(),
        }
    }

    /// Serialize this packet into a complete frame.
    #[must_use]
    pub fn bytes(self) -> Bytes {
        Bytes::from(self)
    }
}

impl From<RconPacket> for Bytes {
    fn from(packet: RconPacket) -> Self {
        encode(packet.packet_type, &packet.payload, packet.request_id)
    }
}

/// A decoded response frame. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    request_id: i32,
    packet_type: RconPacketType,
    data: Bytes,
}

impl Response {
    /// Build a response value.
    pub fn new(
        request_id: i32,
        packet_type: impl Into<RconPacketType>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            request_id,
            packet_type: packet_type.into(),
            data: data.into(),
        }
    }

    /// Request id echoed by the server. `-1` on a rejected authentication.
    #[must_use]
    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    /// Type of the response.
    #[must_use]
    pub fn packet_type(&self) -> RconPacketType {
        self.packet_type
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload decoded as text. Invalid UTF-8 is replaced, not rejected.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Consume the response, returning the payload.
    #[must_use]
    pub fn into_data(self) -> Bytes {
        self.data
    }
}

/// Encode one frame.
///
/// The result is always `payload.len() + 14` bytes long. No bound is placed on
/// the payload length.
pub fn encode(packet_type: impl Into<RconPacketType>, payload: &[u8], request_id: i32) -> Bytes {
    let packet_type: i32 = packet_type.into().into();

    let mut bytes = BytesMut::with_capacity(payload.len() + crate::PACKET_OVERHEAD);

    bytes.put_i32_le(get_remaining_length(payload));
    bytes.put_i32_le(request_id);
    bytes.put_i32_le(packet_type);
    bytes.put_slice(payload);
    bytes.put_slice(&TERMINATOR);

    bytes.freeze()
}

/// Decode one frame from the first `valid_len` bytes of `raw`.
///
/// `valid_len` is the number of bytes actually read, which may be fewer than a
/// whole frame. The terminator must be present, but its content is not checked.
///
/// # Errors
/// Returns [`RconProtocolError::MalformedLength`] if the length field implies a
/// negative payload or one longer than the bytes available, and
/// [`RconProtocolError::MissingTerminator`] unless exactly two bytes follow
/// the payload.
pub fn decode(raw: &[u8], valid_len: usize) -> Result<Response, RconProtocolError> {
    let mut bytes = raw.get(..valid_len).ok_or(RconProtocolError::BufferOverrun {
        valid_len,
        capacity: raw.len(),
    })?;

    if bytes.remaining() < HEADER_LEN {
        return Err(RconProtocolError::TruncatedHeader {
            available: bytes.remaining(),
        });
    }

    let length = bytes.get_i32_le(); // length of remaining packet (not including this integer)
    let request_id = bytes.get_i32_le();
    let packet_type = bytes.get_i32_le();

    let payload_len = i64::from(length) - (size_of::<i32>() * 2 + TERMINATOR.len()) as i64;
    if payload_len < 0 || payload_len > bytes.remaining() as i64 {
        return Err(RconProtocolError::MalformedLength {
            length,
            available: bytes.remaining(),
        });
    }

    let data = bytes.copy_to_bytes(payload_len as usize);

    if bytes.remaining() != TERMINATOR.len() {
        return Err(RconProtocolError::MissingTerminator {
            remaining: bytes.remaining(),
        });
    }

    Ok(Response::new(request_id, packet_type, data))
}

/// Get the *remaining length* of the packet given its payload.
///
/// This is the length of the packet after the length field itself: two
/// [`i32`]s (request id and type), the payload, and the two terminator bytes.
fn get_remaining_length(payload: &[u8]) -> i32 {
    (payload.len() + size_of::<i32>() * 2 + TERMINATOR.len()) as i32
}
