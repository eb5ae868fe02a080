//! Wire protocol layer.
//!
//! - [`packet`]: Packet type tags, request builders, inbound frame record
//! - [`payload`]: Payload kinds, directions, shapes, slot addressing
//! - [`value`]: Typed values with per-kind encode/decode

pub mod packet;
pub mod payload;
pub mod value;
