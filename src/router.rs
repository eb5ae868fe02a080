//! Link event routing
//!
//! The transport's delivery thread hands every decoded event to
//! [`Router::route`], which files it and returns: response and control
//! frames go to the mailbox for waiting callers, alerts to the bounded
//! subscriber channel, discovery replies to the registry. Nothing in this
//! path blocks; a full alert channel drops the alert and a counter
//! records the loss.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crossbeam_channel::Sender;

use crate::alert::{self, DataAlert};
use crate::mailbox::Mailbox;
use crate::node::{Node, NodeAddress};
use crate::protocol::packet::{InboundFrame, PacketType};
use crate::registry::NodeRegistry;
use crate::stats::TrafficCounters;
use crate::transport::LinkEvent;

/// Fan-out from the delivery thread to the session's shared state
pub(crate) struct Router {
    mailbox: Arc<Mailbox>,
    registry: Arc<NodeRegistry>,
    alerts: Sender<DataAlert>,
    counters: Arc<TrafficCounters>,
}

impl Router {
    pub fn new(
        mailbox: Arc<Mailbox>,
        registry: Arc<NodeRegistry>,
        alerts: Sender<DataAlert>,
        counters: Arc<TrafficCounters>,
    ) -> Self {
        Self {
            mailbox,
            registry,
            alerts,
            counters,
        }
    }

    /// File one link event; called on the transport's thread
    pub fn route(&self, event: LinkEvent) {
        match event {
            LinkEvent::Frame { source, body } => self.handle_frame(source, body),
            LinkEvent::NodeFound {
                address,
                identifier,
            } => {
                let node = Node::new(address, identifier);
                if self.registry.register(node.clone()) {
                    log::info!("Discovered node {node}");
                } else {
                    log::debug!("Node {node} announced again");
                }
            }
            LinkEvent::SendFailure { dest } => {
                self.counters.send_failures.fetch_add(1, Ordering::Relaxed);
                log::warn!("Link reports delivery to {dest} failed");
                self.mailbox.push_send_failure(dest);
            }
        }
    }

    fn handle_frame(&self, source: NodeAddress, body: Vec<u8>) {
        self.counters.frames_received.fetch_add(1, Ordering::Relaxed);
        let Some(&tag) = body.first() else {
            self.counters.unknown_frames.fetch_add(1, Ordering::Relaxed);
            log::warn!("Empty frame body from {source}");
            return;
        };
        let Some(packet_type) = PacketType::from_wire(tag) else {
            self.counters.unknown_frames.fetch_add(1, Ordering::Relaxed);
            log::warn!("Unknown packet type 0x{tag:02X} from {source}");
            return;
        };
        match packet_type {
            // Frames a caller may be waiting for
            PacketType::DataResponse
            | PacketType::IoResponse
            | PacketType::InfoResponse
            | PacketType::CtrlAck
            | PacketType::CtrlNack => {
                log::trace!("Queued {packet_type:?} from {source}");
                self.mailbox.push(InboundFrame::new(source, body));
            }
            PacketType::DataAlert => self.handle_alert(source, &body),
            // Only controllers send requests; a node echoing one is noise
            PacketType::DataRequest
            | PacketType::IoRequest
            | PacketType::InfoRequest
            | PacketType::SetRequest => {
                self.counters.unknown_frames.fetch_add(1, Ordering::Relaxed);
                log::warn!("Ignoring request-type frame {packet_type:?} from {source}");
            }
        }
    }

    fn handle_alert(&self, source: NodeAddress, body: &[u8]) {
        match alert::parse_alert(source, body) {
            Ok(alert) => {
                log::trace!(
                    "Alert from {source}: {:?}[{}] = {:?}",
                    alert.kind,
                    alert.index,
                    alert.value
                );
                if self.alerts.try_send(alert).is_err() {
                    self.counters.alerts_dropped.fetch_add(1, Ordering::Relaxed);
                    log::warn!("Alert subscriber lagging, dropped alert from {source}");
                }
            }
            Err(e) => {
                self.counters.unknown_frames.fetch_add(1, Ordering::Relaxed);
                log::warn!("Undecodable alert from {source}: {e}");
            }
        }
    }
}
