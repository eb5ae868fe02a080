//! Mock radio for testing
//!
//! Stands in for a radio module driver: records what the session sends
//! and lets test code inject link events through the captured sink. Clone
//! the mock before handing it to the session to keep a control handle.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{EventSink, LinkEvent, RadioTransport};
use crate::error::{Error, Result};
use crate::node::NodeAddress;

/// Mock radio transport for unit and integration testing
#[derive(Clone)]
pub struct MockRadio {
    inner: Arc<Mutex<MockRadioInner>>,
}

#[derive(Default)]
struct MockRadioInner {
    sink: Option<EventSink>,
    sent: Vec<(NodeAddress, Vec<u8>)>,
    discovery_requests: usize,
    halted: bool,
}

impl MockRadio {
    /// Create an idle mock radio
    pub fn new() -> Self {
        MockRadio {
            inner: Arc::new(Mutex::new(MockRadioInner::default())),
        }
    }

    /// Inject a frame as if a node had transmitted it
    pub fn deliver_frame(&self, source: NodeAddress, body: &[u8]) {
        self.deliver(LinkEvent::Frame {
            source,
            body: body.to_vec(),
        });
    }

    /// Inject a discovery reply announcing a node
    pub fn announce_node(&self, address: NodeAddress, identifier: &str) {
        self.deliver(LinkEvent::NodeFound {
            address,
            identifier: identifier.to_string(),
        });
    }

    /// Inject a link-level delivery failure report
    pub fn report_send_failure(&self, dest: NodeAddress) {
        self.deliver(LinkEvent::SendFailure { dest });
    }

    /// Everything sent through this radio so far
    pub fn sent(&self) -> Vec<(NodeAddress, Vec<u8>)> {
        self.inner.lock().sent.clone()
    }

    /// Forget recorded sends
    pub fn clear_sent(&self) {
        self.inner.lock().sent.clear();
    }

    /// How many discovery broadcasts were requested
    pub fn discovery_requests(&self) -> usize {
        self.inner.lock().discovery_requests
    }

    /// Whether the session has halted the radio
    pub fn is_halted(&self) -> bool {
        self.inner.lock().halted
    }

    fn deliver(&self, event: LinkEvent) {
        let sink = self.inner.lock().sink.clone();
        match sink {
            Some(sink) => sink.deliver(event),
            None => log::warn!("MockRadio: dropping {event:?}, no sink attached"),
        }
    }
}

impl RadioTransport for MockRadio {
    fn start(&mut self, sink: EventSink) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.sink = Some(sink);
        inner.halted = false;
        Ok(())
    }

    fn send(&mut self, dest: NodeAddress, payload: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.halted || inner.sink.is_none() {
            return Err(Error::Transport("mock radio not running".to_string()));
        }
        inner.sent.push((dest, payload.to_vec()));
        Ok(())
    }

    fn request_discovery(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.halted || inner.sink.is_none() {
            return Err(Error::Transport("mock radio not running".to_string()));
        }
        inner.discovery_requests += 1;
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.halted = true;
        inner.sink = None;
        Ok(())
    }
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}
