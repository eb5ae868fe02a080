//! TarangIO - Client protocol layer for wireless sensor networks
//!
//! Talks to battery-powered nodes over a shared radio link: discovers
//! them, enumerates the payload slots they expose, reads and writes typed
//! values, and receives the values nodes push on their own. The radio
//! module driver stays behind the [`transport::RadioTransport`] seam;
//! this crate begins where a decoded frame of bytes arrives and ends
//! where a caller gets a typed value or a well-defined failure.
//!
//! The core is request/response correlation on a protocol without
//! request identifiers: requests are matched to responses by source
//! node, packet type and the echoed slot byte, with rejection, delivery
//! failure and timeout as first-class outcomes. See [`TarangIO`] for the
//! session API and [`matcher`] for the correlation rules.

pub mod alert;
pub mod config;
pub mod error;
pub mod mailbox;
pub mod matcher;
pub mod node;
pub mod protocol;
pub mod registry;
pub mod stats;
pub mod tarang;
pub mod transport;

mod router;

// Re-export commonly used types
pub use alert::DataAlert;
pub use config::TarangConfig;
pub use error::{Error, Result};
pub use node::{Node, NodeAddress};
pub use protocol::packet::PacketType;
pub use protocol::payload::{Direction, PayloadKind, ValueShape};
pub use protocol::value::IoValue;
pub use stats::SessionStats;
pub use tarang::TarangIO;
