//! Typed payload values and their wire encodings
//!
//! Values cross the wire in the shape fixed by their payload kind: one
//! unsigned byte, a big-endian u16, one digital byte carrying eight lines
//! MSB first, or opaque bytes. Encoding checks the value against the
//! kind's shape before producing anything; decoding checks lengths and
//! rejects what it cannot represent.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::protocol::payload::{self, PayloadKind, ValueShape};

/// A decoded payload value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoValue {
    /// One unsigned byte
    U8(u8),
    /// Unsigned 16-bit integer
    U16(u16),
    /// Eight digital lines, position 0 first
    Digital([bool; 8]),
    /// Opaque bytes
    Bytes(Vec<u8>),
}

impl IoValue {
    /// Wire shape this value encodes to
    pub fn shape(&self) -> ValueShape {
        match self {
            IoValue::U8(_) => ValueShape::U8,
            IoValue::U16(_) => ValueShape::U16,
            IoValue::Digital(_) => ValueShape::Digital,
            IoValue::Bytes(_) => ValueShape::Raw,
        }
    }

    /// Encode for a payload kind, verifying the shape matches first
    pub fn encode_for(&self, kind: PayloadKind) -> Result<Vec<u8>> {
        let expected = kind.shape();
        let got = self.shape();
        if got != expected {
            return Err(Error::ShapeMismatch {
                kind,
                expected,
                got,
            });
        }
        Ok(match self {
            IoValue::U8(v) => vec![*v],
            IoValue::U16(v) => v.to_be_bytes().to_vec(),
            IoValue::Digital(lines) => vec![pack_digital(lines)],
            IoValue::Bytes(bytes) => bytes.clone(),
        })
    }

    /// Decode a value of the kind's shape from response payload bytes
    pub fn decode_for(kind: PayloadKind, data: &[u8]) -> Result<IoValue> {
        match kind.shape() {
            ValueShape::U8 => match data {
                [v] => Ok(IoValue::U8(*v)),
                _ => Err(Error::MalformedFrame(format!(
                    "expected 1 value byte for {kind:?}, got {}",
                    data.len()
                ))),
            },
            ValueShape::U16 => match data {
                [hi, lo] => Ok(IoValue::U16(u16::from_be_bytes([*hi, *lo]))),
                _ => Err(Error::MalformedFrame(format!(
                    "expected 2 value bytes for {kind:?}, got {}",
                    data.len()
                ))),
            },
            ValueShape::Digital => match data {
                [byte] => Ok(IoValue::Digital(unpack_digital(*byte))),
                _ => Err(Error::MalformedFrame(format!(
                    "expected 1 digital byte for {kind:?}, got {}",
                    data.len()
                ))),
            },
            ValueShape::Raw => Ok(IoValue::Bytes(data.to_vec())),
        }
    }
}

/// Pack eight lines into the digital byte, position 0 into bit 7
#[inline]
fn pack_digital(lines: &[bool; 8]) -> u8 {
    let mut byte = 0u8;
    for (position, &high) in lines.iter().enumerate() {
        if high {
            byte |= 1 << (7 - position);
        }
    }
    byte
}

/// Unpack the digital byte, bit 7 into position 0
#[inline]
fn unpack_digital(byte: u8) -> [bool; 8] {
    std::array::from_fn(|position| byte & (1 << (7 - position)) != 0)
}

/// Decode an IO_RESPONSE capability listing (payload after the type byte)
///
/// Each byte advertises one payload kind in its high nibble and the
/// instance count minus one in its low nibble, so a node can expose 1 to
/// 16 instances of a kind and each kind appears at most once.
pub fn decode_io_map(data: &[u8]) -> Result<BTreeMap<PayloadKind, u8>> {
    let mut map = BTreeMap::new();
    for &byte in data {
        let (kind_bits, count_bits) = payload::split_slot_byte(byte);
        let kind = PayloadKind::from_wire(kind_bits).ok_or_else(|| {
            Error::MalformedFrame(format!("unknown payload kind {kind_bits} in IO listing"))
        })?;
        if map.insert(kind, count_bits + 1).is_some() {
            return Err(Error::MalformedFrame(format!(
                "payload kind {kind:?} repeated in IO listing"
            )));
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digital_unpack_msb_first() {
        // 0xB0 = 0b1011_0000: positions 0, 2, 3 high
        assert_eq!(
            unpack_digital(0xB0),
            [true, false, true, true, false, false, false, false]
        );
        assert_eq!(unpack_digital(0x00), [false; 8]);
        assert_eq!(unpack_digital(0xFF), [true; 8]);
        assert_eq!(
            unpack_digital(0x01),
            [false, false, false, false, false, false, false, true]
        );
    }

    #[test]
    fn test_digital_pack_is_inverse() {
        for byte in [0x00u8, 0x01, 0x80, 0xB0, 0xA5, 0xFF] {
            assert_eq!(pack_digital(&unpack_digital(byte)), byte);
        }
    }

    #[test]
    fn test_u16_big_endian() {
        let v = IoValue::decode_for(PayloadKind::Int2bOutput, &[0x01, 0x02]).unwrap();
        assert_eq!(v, IoValue::U16(258));
        assert_eq!(
            IoValue::U16(258)
                .encode_for(PayloadKind::Int2bInput)
                .unwrap(),
            vec![0x01, 0x02]
        );
    }

    #[test]
    fn test_decode_length_checks() {
        assert!(IoValue::decode_for(PayloadKind::Int1bOutput, &[]).is_err());
        assert!(IoValue::decode_for(PayloadKind::Int1bOutput, &[1, 2]).is_err());
        assert!(IoValue::decode_for(PayloadKind::Int2bOutput, &[1]).is_err());
        assert!(IoValue::decode_for(PayloadKind::DigitalOutput, &[1, 2]).is_err());
        // Raw accepts anything, including empty
        assert_eq!(
            IoValue::decode_for(PayloadKind::ByteOutput, &[]).unwrap(),
            IoValue::Bytes(vec![])
        );
    }

    #[test]
    fn test_encode_shape_mismatch() {
        let err = IoValue::U8(7)
            .encode_for(PayloadKind::Int2bInput)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                kind: PayloadKind::Int2bInput,
                expected: ValueShape::U16,
                got: ValueShape::U8,
            }
        ));
    }

    #[test]
    fn test_round_trip_every_kind() {
        let cases = [
            (PayloadKind::Int1bOutput, IoValue::U8(0)),
            (PayloadKind::Int1bOutput, IoValue::U8(255)),
            (PayloadKind::Int2bOutput, IoValue::U16(0x0102)),
            (PayloadKind::Int1bInput, IoValue::U8(42)),
            (PayloadKind::Int2bInput, IoValue::U16(u16::MAX)),
            (
                PayloadKind::DigitalInput,
                IoValue::Digital([true, false, true, true, false, false, false, false]),
            ),
            (PayloadKind::DigitalOutput, IoValue::Digital([true; 8])),
            (PayloadKind::ByteInput, IoValue::Bytes(vec![])),
            (PayloadKind::ByteInput, IoValue::Bytes(vec![0xDE, 0xAD])),
            (PayloadKind::ByteOutput, IoValue::Bytes(vec![7])),
            (PayloadKind::ByteOutput, IoValue::Bytes(vec![1, 2, 3, 4, 5])),
        ];
        for (kind, value) in cases {
            let encoded = value.encode_for(kind).unwrap();
            assert_eq!(
                IoValue::decode_for(kind, &encoded).unwrap(),
                value,
                "{kind:?}"
            );
        }
    }

    #[test]
    fn test_io_map_decode() {
        // 0x05: kind 0, 6 instances; 0x23: kind 2, 4 instances
        let map = decode_io_map(&[0x05, 0x23]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&PayloadKind::Int1bOutput), Some(&6));
        assert_eq!(map.get(&PayloadKind::Int1bInput), Some(&4));

        assert!(decode_io_map(&[]).unwrap().is_empty());
        // Low nibble 15 advertises the full 16 instances
        let map = decode_io_map(&[0x7F]).unwrap();
        assert_eq!(map.get(&PayloadKind::ByteOutput), Some(&16));
    }

    #[test]
    fn test_io_map_rejects_bad_listings() {
        // Kind nibble 9 is outside the protocol
        assert!(decode_io_map(&[0x90]).is_err());
        // Kind 0 listed twice
        assert!(decode_io_map(&[0x05, 0x02]).is_err());
    }
}
