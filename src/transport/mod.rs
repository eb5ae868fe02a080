//! Transport seam to the radio link layer
//!
//! Everything below the application protocol lives behind
//! [`RadioTransport`]: serial framing, escaping, checksums, addressing and
//! the discovery command belong to the radio module driver, not to this
//! crate. The driver pushes decoded link events through an [`EventSink`]
//! from whatever thread it reads on; delivery must never block it.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::node::NodeAddress;

pub mod mock;
pub use mock::MockRadio;

/// One decoded event from the radio link
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// Application frame received from a node
    Frame {
        /// Long address of the sender
        source: NodeAddress,
        /// Frame body, first byte is the application packet type
        body: Vec<u8>,
    },
    /// Discovery reply announcing a node
    NodeFound {
        /// Long address of the announced node
        address: NodeAddress,
        /// Identifier string configured on the node
        identifier: String,
    },
    /// The link layer reports an earlier send never reached its node
    SendFailure {
        /// Address the lost frame was sent to
        dest: NodeAddress,
    },
}

/// Cheap cloneable handle the transport calls for every link event
///
/// Created by the session when it starts a transport; transports only
/// call [`EventSink::deliver`]. Delivery routes the event and returns
/// without blocking.
#[derive(Clone)]
pub struct EventSink {
    deliver: Arc<dyn Fn(LinkEvent) + Send + Sync>,
}

impl EventSink {
    /// Wrap a delivery function
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(LinkEvent) + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Hand one event to the session
    #[inline]
    pub fn deliver(&self, event: LinkEvent) {
        (self.deliver)(event)
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventSink")
    }
}

/// Driver for a radio module connected to this controller
pub trait RadioTransport: Send {
    /// Begin operating the link and delivering events to the sink
    fn start(&mut self, sink: EventSink) -> Result<()>;

    /// Transmit one application frame to a node
    ///
    /// Returns once the frame is handed to the radio; actual delivery is
    /// asynchronous and a loss surfaces later as
    /// [`LinkEvent::SendFailure`].
    fn send(&mut self, dest: NodeAddress, payload: &[u8]) -> Result<()>;

    /// Broadcast a node discovery request
    ///
    /// Replies arrive as [`LinkEvent::NodeFound`] over the discovery
    /// window.
    fn request_discovery(&mut self) -> Result<()>;

    /// Stop delivering events and release the link
    fn halt(&mut self) -> Result<()>;
}
