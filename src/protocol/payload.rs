//! Payload kinds and slot addressing
//!
//! Every node exposes up to 16 instances ("slots") of each payload kind.
//! A slot is addressed on the wire by a single byte packing the kind's
//! 4-bit value into the high nibble and the instance index into the low
//! nibble. Kind, direction and value shape are a fixed table of the
//! protocol and are never inferred from traffic.

use crate::error::{Error, Result};

/// Highest addressable payload instance (the index nibble is 4 bits)
pub const MAX_INDEX: u8 = 15;

/// Who produces a payload's data
///
/// Named from the controller's vantage: `Source` payloads are produced by
/// the node and read here; `Sink` payloads are consumed by the node and
/// written here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Node produces, controller reads
    Source,
    /// Node consumes, controller writes
    Sink,
}

/// Wire shape of a payload's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// One unsigned byte
    U8,
    /// Two bytes, big-endian unsigned
    U16,
    /// One byte carrying eight booleans, MSB first
    Digital,
    /// Opaque bytes, length defined by the node
    Raw,
}

impl ValueShape {
    /// Encoded value length in bytes, `None` for the unconstrained raw shape
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            ValueShape::U8 => Some(1),
            ValueShape::U16 => Some(2),
            ValueShape::Digital => Some(1),
            ValueShape::Raw => None,
        }
    }
}

/// The eight payload kinds a node can expose
///
/// Discriminants are the 4-bit wire values. "Output" kinds are outputs of
/// the node (readable), "Input" kinds are inputs to the node (writable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PayloadKind {
    /// 1-byte integer the node produces
    Int1bOutput = 0,
    /// 2-byte integer the node produces
    Int2bOutput = 1,
    /// 1-byte integer the node accepts
    Int1bInput = 2,
    /// 2-byte integer the node accepts
    Int2bInput = 3,
    /// Eight digital lines the node accepts
    DigitalInput = 4,
    /// Eight digital lines the node produces
    DigitalOutput = 5,
    /// Raw bytes the node accepts
    ByteInput = 6,
    /// Raw bytes the node produces
    ByteOutput = 7,
}

impl PayloadKind {
    /// All kinds in wire-value order
    pub const ALL: [PayloadKind; 8] = [
        PayloadKind::Int1bOutput,
        PayloadKind::Int2bOutput,
        PayloadKind::Int1bInput,
        PayloadKind::Int2bInput,
        PayloadKind::DigitalInput,
        PayloadKind::DigitalOutput,
        PayloadKind::ByteInput,
        PayloadKind::ByteOutput,
    ];

    /// 4-bit wire value
    #[inline]
    pub const fn wire_value(self) -> u8 {
        self as u8
    }

    /// Decode a 4-bit wire value
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(PayloadKind::Int1bOutput),
            1 => Some(PayloadKind::Int2bOutput),
            2 => Some(PayloadKind::Int1bInput),
            3 => Some(PayloadKind::Int2bInput),
            4 => Some(PayloadKind::DigitalInput),
            5 => Some(PayloadKind::DigitalOutput),
            6 => Some(PayloadKind::ByteInput),
            7 => Some(PayloadKind::ByteOutput),
            _ => None,
        }
    }

    /// Who produces this payload's data
    pub const fn direction(self) -> Direction {
        match self {
            PayloadKind::Int1bOutput
            | PayloadKind::Int2bOutput
            | PayloadKind::DigitalOutput
            | PayloadKind::ByteOutput => Direction::Source,
            PayloadKind::Int1bInput
            | PayloadKind::Int2bInput
            | PayloadKind::DigitalInput
            | PayloadKind::ByteInput => Direction::Sink,
        }
    }

    /// Wire shape of this payload's value
    pub const fn shape(self) -> ValueShape {
        match self {
            PayloadKind::Int1bOutput | PayloadKind::Int1bInput => ValueShape::U8,
            PayloadKind::Int2bOutput | PayloadKind::Int2bInput => ValueShape::U16,
            PayloadKind::DigitalInput | PayloadKind::DigitalOutput => ValueShape::Digital,
            PayloadKind::ByteInput | PayloadKind::ByteOutput => ValueShape::Raw,
        }
    }

    /// Whether the controller may read this payload
    #[inline]
    pub const fn is_readable(self) -> bool {
        matches!(self.direction(), Direction::Source)
    }

    /// Whether the controller may write this payload
    #[inline]
    pub const fn is_writable(self) -> bool {
        matches!(self.direction(), Direction::Sink)
    }
}

/// Pack a kind and instance index into the slot address byte
///
/// Fails before anything touches the wire when the index does not fit the
/// 4-bit field.
#[inline]
pub fn slot_byte(kind: PayloadKind, index: u8) -> Result<u8> {
    if index > MAX_INDEX {
        return Err(Error::IndexOutOfRange(index));
    }
    Ok((kind.wire_value() << 4) | index)
}

/// Split a slot address byte into its raw kind nibble and index
#[inline]
pub const fn split_slot_byte(byte: u8) -> (u8, u8) {
    (byte >> 4, byte & 0x0F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_round_trip() {
        for kind in PayloadKind::ALL {
            assert_eq!(PayloadKind::from_wire(kind.wire_value()), Some(kind));
        }
        for value in 8..=15u8 {
            assert_eq!(PayloadKind::from_wire(value), None);
        }
    }

    #[test]
    fn test_direction_table() {
        assert_eq!(PayloadKind::Int1bOutput.direction(), Direction::Source);
        assert_eq!(PayloadKind::DigitalOutput.direction(), Direction::Source);
        assert_eq!(PayloadKind::ByteOutput.direction(), Direction::Source);
        assert_eq!(PayloadKind::Int2bInput.direction(), Direction::Sink);
        assert_eq!(PayloadKind::DigitalInput.direction(), Direction::Sink);
        assert!(PayloadKind::Int2bOutput.is_readable());
        assert!(!PayloadKind::Int2bOutput.is_writable());
        assert!(PayloadKind::ByteInput.is_writable());
    }

    #[test]
    fn test_shape_table() {
        assert_eq!(PayloadKind::Int1bOutput.shape(), ValueShape::U8);
        assert_eq!(PayloadKind::Int2bInput.shape(), ValueShape::U16);
        assert_eq!(PayloadKind::DigitalInput.shape(), ValueShape::Digital);
        assert_eq!(PayloadKind::ByteOutput.shape(), ValueShape::Raw);
        assert_eq!(ValueShape::U16.fixed_len(), Some(2));
        assert_eq!(ValueShape::Raw.fixed_len(), None);
    }

    #[test]
    fn test_slot_byte_packing() {
        // Kind 2 (Int1bInput), index 5 -> 0x25
        assert_eq!(slot_byte(PayloadKind::Int1bInput, 5).unwrap(), 0x25);
        assert_eq!(slot_byte(PayloadKind::Int1bOutput, 0).unwrap(), 0x00);
        assert_eq!(slot_byte(PayloadKind::ByteOutput, 15).unwrap(), 0x7F);
        assert_eq!(split_slot_byte(0x25), (2, 5));
        assert_eq!(split_slot_byte(0x7F), (7, 15));
    }

    #[test]
    fn test_slot_byte_index_bound() {
        assert!(matches!(
            slot_byte(PayloadKind::Int1bOutput, 16),
            Err(Error::IndexOutOfRange(16))
        ));
        assert!(slot_byte(PayloadKind::Int1bOutput, 15).is_ok());
    }
}
