//! Unsolicited data alerts
//!
//! Nodes can push a value without being asked, typically on a threshold
//! crossing or an input edge. Alert frames mirror DATA_RESPONSE: the type
//! byte, the slot byte, then the value encoded per the slot's kind.
//! Alerts bypass the request/response mailbox entirely and reach the
//! subscriber over a bounded channel, so a slow consumer can never stall
//! the delivery thread.

use crate::error::{Error, Result};
use crate::node::NodeAddress;
use crate::protocol::packet::PacketType;
use crate::protocol::payload::{self, PayloadKind};
use crate::protocol::value::IoValue;

/// One value a node pushed on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataAlert {
    /// Node that sent the alert
    pub source: NodeAddress,
    /// Payload kind of the reported slot
    pub kind: PayloadKind,
    /// Instance index of the reported slot
    pub index: u8,
    /// Decoded value
    pub value: IoValue,
}

/// Decode a DATA_ALERT frame body
pub fn parse_alert(source: NodeAddress, body: &[u8]) -> Result<DataAlert> {
    match body {
        [tag, slot, data @ ..] if *tag == PacketType::DataAlert.wire_value() => {
            let (kind_bits, index) = payload::split_slot_byte(*slot);
            let kind = PayloadKind::from_wire(kind_bits).ok_or_else(|| {
                Error::MalformedFrame(format!("unknown payload kind {kind_bits} in alert"))
            })?;
            let value = IoValue::decode_for(kind, data)?;
            Ok(DataAlert {
                source,
                kind,
                index,
                value,
            })
        }
        _ => Err(Error::MalformedFrame(
            "alert body shorter than type and slot bytes".to_string(),
        )),
    }
}
