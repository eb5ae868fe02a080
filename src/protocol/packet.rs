//! Application packet types and request frame builders
//!
//! A frame body is the byte slice the radio hands us after link-layer
//! decoding: one packet-type byte followed by type-specific content. This
//! module owns the type tags, the builders for the four request frames the
//! controller can send, and the `InboundFrame` record the delivery path
//! stores for waiting callers.
//!
//! Request layouts:
//! - `IO_REQUEST`   = `[18]`
//! - `INFO_REQUEST` = `[20, slot]`
//! - `DATA_REQUEST` = `[16, slot]`
//! - `SET_REQUEST`  = `[22, slot, value...]`
//!
//! where `slot` packs kind and index (see [`payload::slot_byte`]).

use std::time::Instant;

use crate::error::Result;
use crate::node::NodeAddress;
use crate::protocol::payload::{self, PayloadKind};
use crate::protocol::value::IoValue;

/// Application packet type, the first byte of every frame body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Controller asks for a payload's current value
    DataRequest = 16,
    /// Node returns a payload value
    DataResponse = 17,
    /// Controller asks which payloads a node exposes
    IoRequest = 18,
    /// Node returns its payload capability map
    IoResponse = 19,
    /// Controller asks for a payload's descriptive info
    InfoRequest = 20,
    /// Node returns descriptive info bytes
    InfoResponse = 21,
    /// Controller writes a payload value
    SetRequest = 22,
    /// Node pushes a value without being asked
    DataAlert = 23,
    /// Node rejected a request (second byte names the request type)
    CtrlNack = 254,
    /// Node confirmed a request
    CtrlAck = 255,
}

impl PacketType {
    /// Wire tag byte
    #[inline]
    pub const fn wire_value(self) -> u8 {
        self as u8
    }

    /// Decode a tag byte, `None` for bytes outside the protocol
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            16 => Some(PacketType::DataRequest),
            17 => Some(PacketType::DataResponse),
            18 => Some(PacketType::IoRequest),
            19 => Some(PacketType::IoResponse),
            20 => Some(PacketType::InfoRequest),
            21 => Some(PacketType::InfoResponse),
            22 => Some(PacketType::SetRequest),
            23 => Some(PacketType::DataAlert),
            254 => Some(PacketType::CtrlNack),
            255 => Some(PacketType::CtrlAck),
            _ => None,
        }
    }
}

// ============================================================================
// Request builders
// ============================================================================

/// Build an IO_REQUEST frame (node capability query, no arguments)
#[inline]
pub fn io_request() -> Vec<u8> {
    vec![PacketType::IoRequest.wire_value()]
}

/// Build an INFO_REQUEST frame for one payload slot
pub fn info_request(kind: PayloadKind, index: u8) -> Result<Vec<u8>> {
    Ok(vec![
        PacketType::InfoRequest.wire_value(),
        payload::slot_byte(kind, index)?,
    ])
}

/// Build a DATA_REQUEST frame for one payload slot
pub fn data_request(kind: PayloadKind, index: u8) -> Result<Vec<u8>> {
    Ok(vec![
        PacketType::DataRequest.wire_value(),
        payload::slot_byte(kind, index)?,
    ])
}

/// Build a SET_REQUEST frame carrying an encoded value
///
/// Validates the index and the value's shape against the kind before any
/// byte is produced.
pub fn set_request(kind: PayloadKind, index: u8, value: &IoValue) -> Result<Vec<u8>> {
    let slot = payload::slot_byte(kind, index)?;
    let encoded = value.encode_for(kind)?;
    let mut frame = Vec::with_capacity(2 + encoded.len());
    frame.push(PacketType::SetRequest.wire_value());
    frame.push(slot);
    frame.extend_from_slice(&encoded);
    Ok(frame)
}

// ============================================================================
// Inbound frames
// ============================================================================

/// One frame received from a node, as stored for waiting callers
///
/// `body` keeps the leading packet-type byte so acceptance criteria can
/// match on raw bytes; `received_at` drives stale-frame eviction.
#[derive(Debug, Clone)]
pub struct InboundFrame {
    /// Long address of the sending node
    pub source: NodeAddress,
    /// Raw frame body, first byte is the packet type
    pub body: Vec<u8>,
    /// When the delivery path accepted the frame
    pub received_at: Instant,
}

impl InboundFrame {
    /// Record a frame arriving now
    pub fn new(source: NodeAddress, body: Vec<u8>) -> Self {
        Self {
            source,
            body,
            received_at: Instant::now(),
        }
    }

    /// Decoded packet type, `None` for an empty body or unknown tag
    pub fn packet_type(&self) -> Option<PacketType> {
        self.body.first().and_then(|&b| PacketType::from_wire(b))
    }
}
