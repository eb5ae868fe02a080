//! Request/response correlation
//!
//! The protocol carries no correlation identifiers: a response is tied to
//! its request only by source node, packet type and, for slot-addressed
//! requests, the echoed slot byte. `RequestCriteria` captures those checks
//! for one in-flight request; [`await_response`] blocks on the mailbox
//! until a frame qualifies, the node rejects the request, the link layer
//! reports the send lost, or the deadline passes.

use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::mailbox::Mailbox;
use crate::node::NodeAddress;
use crate::protocol::packet::{InboundFrame, PacketType};

/// What one in-flight request accepts as its response
///
/// Built per call and dropped when the wait resolves. Frames that fail
/// these checks are left untouched for other waiters.
#[derive(Debug, Clone)]
pub struct RequestCriteria {
    /// Node the request went to; frames from anyone else never qualify
    pub node: NodeAddress,
    /// Packet type of a successful response
    pub accepted: PacketType,
    /// Request type a rejection would name in its CTRL_NACK
    pub failure: PacketType,
    /// Bytes that must immediately follow the type byte
    pub prefix: Option<Vec<u8>>,
    /// Exact total body length, for fixed-size responses
    pub exact_len: Option<usize>,
    /// When the criteria were built; a delivery failure recorded before
    /// this instant belongs to an earlier request and never resolves
    /// this wait
    pub issued_at: Instant,
}

impl RequestCriteria {
    /// Criteria accepting any body of the given type from the node
    pub fn new(node: NodeAddress, accepted: PacketType, failure: PacketType) -> Self {
        Self {
            node,
            accepted,
            failure,
            prefix: None,
            exact_len: None,
            issued_at: Instant::now(),
        }
    }

    /// Additionally require the body to echo these bytes after the type
    pub fn with_prefix(mut self, prefix: Vec<u8>) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Additionally require an exact total body length
    pub fn with_exact_len(mut self, len: usize) -> Self {
        self.exact_len = Some(len);
        self
    }

    /// Whether a frame is the response this request is waiting for
    pub fn matches(&self, frame: &InboundFrame) -> bool {
        if frame.source != self.node {
            return false;
        }
        if frame.body.first() != Some(&self.accepted.wire_value()) {
            return false;
        }
        if let Some(prefix) = &self.prefix {
            match frame.body.get(1..1 + prefix.len()) {
                Some(echo) if echo == prefix.as_slice() => {}
                _ => return false,
            }
        }
        if let Some(len) = self.exact_len
            && frame.body.len() != len
        {
            return false;
        }
        true
    }

    /// Whether a frame is a rejection of this request
    ///
    /// A rejection is exactly two bytes, CTRL_NACK followed by the
    /// request type it refuses; rejections of other request types to the
    /// same node stay in the mailbox for their own waiters.
    pub fn is_failure_nack(&self, frame: &InboundFrame) -> bool {
        frame.source == self.node
            && frame.body.len() == 2
            && frame.body[0] == PacketType::CtrlNack.wire_value()
            && frame.body[1] == self.failure.wire_value()
    }
}

/// Block until the request resolves, one way or the other
///
/// Scan order on every wakeup: a qualifying response wins, then a
/// rejection, then a delivery failure for the node recorded since the
/// request was issued; whichever is consumed resolves the wait. When
/// nothing qualifies by the deadline the wait fails with `Timeout`,
/// never before the deadline. `timeout: None` waits forever. On success
/// the body is returned with the type byte stripped.
///
/// Two requests outstanding against the same node for the same response
/// type are indistinguishable on the wire; whichever waiter scans first
/// claims the frame. Callers that need the pairing serialize such
/// requests.
pub fn await_response(
    mailbox: &Mailbox,
    criteria: &RequestCriteria,
    timeout: Option<Duration>,
) -> Result<Vec<u8>> {
    let started = Instant::now();
    let deadline = timeout.map(|t| started + t);
    let outcome = mailbox.wait_for(deadline, |store| {
        if let Some(frame) = store.take_first_matching(|f| criteria.matches(f)) {
            log::trace!(
                "Matched {:?} from {} after {:?}",
                criteria.accepted,
                criteria.node,
                started.elapsed()
            );
            return Some(Ok(frame.body[1..].to_vec()));
        }
        if store
            .take_first_matching(|f| criteria.is_failure_nack(f))
            .is_some()
        {
            log::debug!("Node {} rejected {:?}", criteria.node, criteria.failure);
            return Some(Err(Error::Nack {
                request: criteria.failure,
            }));
        }
        if store
            .take_send_failure(criteria.node, criteria.issued_at)
            .is_some()
        {
            log::debug!(
                "Delivery of {:?} to {} reported failed",
                criteria.failure,
                criteria.node
            );
            return Some(Err(Error::SendFailed {
                dest: criteria.node,
            }));
        }
        None
    });
    match outcome {
        Some(result) => result,
        None => Err(Error::Timeout {
            waited: started.elapsed(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TrafficCounters;
    use std::sync::Arc;
    use std::thread;

    fn addr(last: u8) -> NodeAddress {
        NodeAddress::new([0, 0, 0, 0, 0, 0, 0, last])
    }

    fn mailbox() -> Mailbox {
        Mailbox::new(None, None, Arc::new(TrafficCounters::new()))
    }

    fn data_criteria(node: NodeAddress) -> RequestCriteria {
        RequestCriteria::new(node, PacketType::DataResponse, PacketType::DataRequest)
    }

    #[test]
    fn test_matches_checks_node_and_type() {
        let criteria = data_criteria(addr(1));
        assert!(criteria.matches(&InboundFrame::new(addr(1), vec![17, 0, 5])));
        // Wrong node
        assert!(!criteria.matches(&InboundFrame::new(addr(2), vec![17, 0, 5])));
        // Wrong type
        assert!(!criteria.matches(&InboundFrame::new(addr(1), vec![19, 0, 5])));
        // Empty body
        assert!(!criteria.matches(&InboundFrame::new(addr(1), vec![])));
    }

    #[test]
    fn test_matches_prefix_and_length() {
        let criteria = data_criteria(addr(1)).with_prefix(vec![0x42]).with_exact_len(3);
        assert!(criteria.matches(&InboundFrame::new(addr(1), vec![17, 0x42, 9])));
        // Slot echo differs
        assert!(!criteria.matches(&InboundFrame::new(addr(1), vec![17, 0x41, 9])));
        // Body shorter than the prefix
        assert!(!criteria.matches(&InboundFrame::new(addr(1), vec![17])));
        // Length off by one
        assert!(!criteria.matches(&InboundFrame::new(addr(1), vec![17, 0x42, 9, 9])));
    }

    #[test]
    fn test_prefix_alone_accepts_empty_payload() {
        let criteria = RequestCriteria::new(
            addr(1),
            PacketType::InfoResponse,
            PacketType::InfoRequest,
        )
        .with_prefix(vec![0x42]);
        assert!(criteria.matches(&InboundFrame::new(addr(1), vec![21, 0x42])));
    }

    #[test]
    fn test_nack_predicate_is_exact() {
        let criteria = data_criteria(addr(1));
        assert!(criteria.is_failure_nack(&InboundFrame::new(addr(1), vec![254, 16])));
        // Names a different request type
        assert!(!criteria.is_failure_nack(&InboundFrame::new(addr(1), vec![254, 22])));
        // Wrong node
        assert!(!criteria.is_failure_nack(&InboundFrame::new(addr(2), vec![254, 16])));
        // Trailing byte makes it something else
        assert!(!criteria.is_failure_nack(&InboundFrame::new(addr(1), vec![254, 16, 0])));
    }

    #[test]
    fn test_await_returns_body_without_type_byte() {
        let mailbox = mailbox();
        mailbox.push(InboundFrame::new(addr(1), vec![17, 0x00, 42]));
        let body = await_response(
            &mailbox,
            &data_criteria(addr(1)),
            Some(Duration::from_secs(1)),
        )
        .unwrap();
        assert_eq!(body, vec![0x00, 42]);
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_await_prefers_match_over_nack() {
        let mailbox = mailbox();
        mailbox.push(InboundFrame::new(addr(1), vec![254, 16]));
        mailbox.push(InboundFrame::new(addr(1), vec![17, 0x00, 42]));
        let body = await_response(
            &mailbox,
            &data_criteria(addr(1)),
            Some(Duration::from_secs(1)),
        )
        .unwrap();
        assert_eq!(body, vec![0x00, 42]);
        // The rejection stays behind for whoever it belongs to
        assert_eq!(mailbox.len(), 1);
    }

    #[test]
    fn test_await_fails_on_nack_and_consumes_it() {
        let mailbox = mailbox();
        mailbox.push(InboundFrame::new(addr(1), vec![254, 16]));
        let err = await_response(
            &mailbox,
            &data_criteria(addr(1)),
            Some(Duration::from_secs(1)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Nack {
                request: PacketType::DataRequest
            }
        ));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_await_surfaces_send_failure() {
        let mailbox = mailbox();
        let criteria = data_criteria(addr(1));
        // Reported after the request went out
        mailbox.push_send_failure(addr(1));
        let err =
            await_response(&mailbox, &criteria, Some(Duration::from_secs(1))).unwrap_err();
        assert!(matches!(err, Error::SendFailed { dest } if dest == addr(1)));
    }

    #[test]
    fn test_await_ignores_stale_failure_note() {
        let mailbox = mailbox();
        // Late failure report for a request that already gave up
        mailbox.push_send_failure(addr(1));
        thread::sleep(Duration::from_millis(5));
        let criteria = data_criteria(addr(1));
        let err =
            await_response(&mailbox, &criteria, Some(Duration::from_millis(80))).unwrap_err();
        // The old note must not fail the new request
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn test_await_times_out_no_earlier_than_asked() {
        let mailbox = mailbox();
        // A frame for a different node must not satisfy the wait
        mailbox.push(InboundFrame::new(addr(2), vec![17, 0x00, 42]));
        let started = Instant::now();
        let err = await_response(
            &mailbox,
            &data_criteria(addr(1)),
            Some(Duration::from_millis(80)),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(started.elapsed() >= Duration::from_millis(80));
        // The other node's frame is untouched
        assert_eq!(mailbox.len(), 1);
    }

    #[test]
    fn test_await_picks_up_late_arrival() {
        let mailbox = Arc::new(mailbox());
        let pusher = {
            let mailbox = mailbox.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                mailbox.push(InboundFrame::new(addr(1), vec![17, 0x10, 0x01, 0x02]));
            })
        };
        let body = await_response(
            &mailbox,
            &data_criteria(addr(1)).with_prefix(vec![0x10]).with_exact_len(4),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(body, vec![0x10, 0x01, 0x02]);
        pusher.join().unwrap();
    }
}
