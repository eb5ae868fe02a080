//! Error types for TarangIO

use std::time::Duration;

use crate::node::NodeAddress;
use crate::protocol::packet::PacketType;
use crate::protocol::payload::{PayloadKind, ValueShape};

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// TarangIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be serialized
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Session used before `start` or after `stop`
    #[error("Session not started")]
    NotStarted,

    /// Payload index outside the 4-bit wire range
    #[error("Payload index {0} out of range (0-15)")]
    IndexOutOfRange(u8),

    /// Read requested on a payload the node only consumes
    #[error("Payload kind {0:?} is not readable")]
    NotReadable(PayloadKind),

    /// Write requested on a payload the node only produces
    #[error("Payload kind {0:?} is not writable")]
    NotWritable(PayloadKind),

    /// Value does not fit the payload kind's wire shape
    #[error("Value shape mismatch for {kind:?}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Payload kind being encoded for
        kind: PayloadKind,
        /// Shape the kind carries on the wire
        expected: ValueShape,
        /// Shape of the value supplied
        got: ValueShape,
    },

    /// Remote node rejected the request
    #[error("Request {request:?} rejected by node")]
    Nack {
        /// Request type named in the negative acknowledgement
        request: PacketType,
    },

    /// No qualifying response before the deadline
    #[error("No response within {waited:?}")]
    Timeout {
        /// How long the caller waited
        waited: Duration,
    },

    /// Response frame could not be decoded
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Link layer reported the request never reached the node
    #[error("Delivery to {dest} failed")]
    SendFailed {
        /// Address the frame was sent to
        dest: NodeAddress,
    },

    /// Transport backend failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether retrying the same request later can reasonably succeed
    ///
    /// True for rejection, timeout and delivery failure. Validation
    /// errors fail the same way every time and are not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Nack { .. } | Error::Timeout { .. } | Error::SendFailed { .. }
        )
    }
}
