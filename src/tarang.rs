//! TarangIO - Session facade for typed I/O over a sensor network

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::alert::DataAlert;
use crate::config::TarangConfig;
use crate::error::{Error, Result};
use crate::mailbox::Mailbox;
use crate::matcher::{self, RequestCriteria};
use crate::node::{Node, NodeAddress};
use crate::protocol::packet::{self, PacketType};
use crate::protocol::payload::PayloadKind;
use crate::protocol::value::{self, IoValue};
use crate::registry::NodeRegistry;
use crate::router::Router;
use crate::stats::{SessionStats, TrafficCounters};
use crate::transport::{EventSink, RadioTransport};

/// TarangIO - One session against a wireless sensor network
///
/// Owns the radio transport, the registry of discovered nodes and the
/// mailbox of inbound frames. Every request blocks its calling thread
/// until the node answers, rejects, or the response timeout passes;
/// different nodes can be talked to from different threads concurrently.
///
/// # Request correlation
///
/// The wire protocol carries no request identifiers. A response is tied
/// to its request by source node, packet type and the echoed slot byte,
/// which cannot tell apart two outstanding requests to the same node for
/// the same response type; the first qualifying frame answers whichever
/// caller scans first. Serialize such requests when the pairing matters.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use tarang_io::{TarangConfig, TarangIO};
/// use tarang_io::transport::MockRadio;
///
/// # fn main() -> tarang_io::Result<()> {
/// let net = TarangIO::start(MockRadio::new(), TarangConfig::default())?;
///
/// // Find out who is out there and what they expose
/// net.discover(Duration::from_secs(5))?;
/// for node in net.nodes() {
///     let capabilities = net.get_node_io(&node)?;
///     for (kind, count) in &capabilities {
///         println!("{node}: {count} x {kind:?}");
///     }
/// }
///
/// net.stop()?;
/// # Ok(())
/// # }
/// ```
pub struct TarangIO {
    /// Radio transport, locked only for the duration of a send
    transport: Mutex<Box<dyn RadioTransport>>,

    /// Inbound frames held for waiting callers
    mailbox: Arc<Mailbox>,

    /// Nodes seen by discovery
    registry: Arc<NodeRegistry>,

    /// Subscriber side of the alert channel
    alerts: Receiver<DataAlert>,

    /// Session traffic counters
    counters: Arc<TrafficCounters>,

    /// Tuning knobs
    config: TarangConfig,

    /// Set once `stop` has halted the radio
    stopped: AtomicBool,
}

impl TarangIO {
    // === Lifecycle ===

    /// Start a session over a radio transport
    ///
    /// Wires the transport's event delivery into the session and begins
    /// operating the link. The transport's reader context calls back into
    /// the session for every event; nothing on that path blocks.
    pub fn start<T: RadioTransport + 'static>(transport: T, config: TarangConfig) -> Result<Self> {
        log::info!("TarangIO: Starting session");

        let counters = Arc::new(TrafficCounters::new());
        let mailbox = Arc::new(Mailbox::new(
            config.mailbox_bound(),
            config.frame_ttl(),
            counters.clone(),
        ));
        let registry = Arc::new(NodeRegistry::new());
        let (alert_tx, alert_rx) = crossbeam_channel::bounded(config.alert_queue_depth.max(1));

        let router = Router::new(
            mailbox.clone(),
            registry.clone(),
            alert_tx,
            counters.clone(),
        );
        let sink = EventSink::new(move |event| router.route(event));

        let mut transport: Box<dyn RadioTransport> = Box::new(transport);
        transport.start(sink)?;

        log::info!(
            "TarangIO: Session ready (response timeout {:?})",
            config.response_timeout()
        );

        Ok(Self {
            transport: Mutex::new(transport),
            mailbox,
            registry,
            alerts: alert_rx,
            counters,
            config,
            stopped: AtomicBool::new(false),
        })
    }

    /// Halt the radio and end the session
    ///
    /// Idempotent. Requests issued after this fail with `NotStarted`;
    /// listings and stats keep working on the last known state.
    pub fn stop(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        log::info!("TarangIO: Stopping session");
        self.transport.lock().halt()?;
        log::info!("TarangIO: Session stopped");
        Ok(())
    }

    // === Discovery ===

    /// Broadcast a discovery request and collect replies for the window
    ///
    /// Blocks the caller for the whole window while the delivery context
    /// files replies, so `nodes` reflects every answer received in the
    /// window once this returns. Late replies still get registered.
    pub fn discover(&self, window: Duration) -> Result<()> {
        self.ensure_running()?;
        log::info!("TarangIO: Discovering nodes ({window:?} window)");
        self.transport.lock().request_discovery()?;
        thread::sleep(window);
        log::info!(
            "TarangIO: Discovery window closed, {} node(s) known",
            self.registry.len()
        );
        Ok(())
    }

    /// Every node discovery has seen, ordered by address
    pub fn nodes(&self) -> Vec<Node> {
        self.registry.all()
    }

    /// Node registered under an address, if discovery has seen it
    pub fn node(&self, address: NodeAddress) -> Option<Node> {
        self.registry.lookup(address)
    }

    // === Typed I/O ===

    /// Ask a node which payloads it exposes
    ///
    /// Returns a map from payload kind to the number of instances the
    /// node carries (1 to 16 per advertised kind).
    pub fn get_node_io(&self, node: &Node) -> Result<BTreeMap<PayloadKind, u8>> {
        log::debug!("TarangIO: Query IO capabilities of {node}");
        let criteria =
            RequestCriteria::new(node.address, PacketType::IoResponse, PacketType::IoRequest);
        let body = self.transact(node.address, packet::io_request(), &criteria)?;
        value::decode_io_map(&body)
    }

    /// Ask a node for a payload slot's descriptive info bytes
    ///
    /// The info content is defined by the node (typically a label or unit
    /// string); it is returned verbatim.
    pub fn get_payload_info(&self, node: &Node, kind: PayloadKind, index: u8) -> Result<Vec<u8>> {
        log::debug!("TarangIO: Query info for {kind:?}[{index}] on {node}");
        let frame = packet::info_request(kind, index)?;
        let slot = frame[1];
        let criteria =
            RequestCriteria::new(node.address, PacketType::InfoResponse, PacketType::InfoRequest)
                .with_prefix(vec![slot]);
        let body = self.transact(node.address, frame, &criteria)?;
        Ok(body[1..].to_vec())
    }

    /// Read the current value of a payload the node produces
    ///
    /// Fails with `NotReadable` before anything is transmitted when the
    /// kind is one the node only consumes.
    pub fn get_data(&self, node: &Node, kind: PayloadKind, index: u8) -> Result<IoValue> {
        if !kind.is_readable() {
            return Err(Error::NotReadable(kind));
        }
        log::debug!("TarangIO: Read {kind:?}[{index}] from {node}");
        let frame = packet::data_request(kind, index)?;
        let slot = frame[1];
        let mut criteria =
            RequestCriteria::new(node.address, PacketType::DataResponse, PacketType::DataRequest)
                .with_prefix(vec![slot]);
        // Fixed-shape responses have a known total length: type byte,
        // slot byte, value bytes
        if let Some(value_len) = kind.shape().fixed_len() {
            criteria = criteria.with_exact_len(value_len + 2);
        }
        let body = self.transact(node.address, frame, &criteria)?;
        IoValue::decode_for(kind, &body[1..])
    }

    /// Write a value to a payload the node consumes
    ///
    /// Fails with `NotWritable` or `ShapeMismatch` before anything is
    /// transmitted. Waits for the node's CTRL_ACK; the acknowledgement
    /// carries no echo of the request, so it is matched on type alone.
    pub fn send_data(
        &self,
        node: &Node,
        kind: PayloadKind,
        index: u8,
        value: &IoValue,
    ) -> Result<()> {
        if !kind.is_writable() {
            return Err(Error::NotWritable(kind));
        }
        log::debug!("TarangIO: Write {value:?} to {kind:?}[{index}] on {node}");
        let frame = packet::set_request(kind, index, value)?;
        let criteria =
            RequestCriteria::new(node.address, PacketType::CtrlAck, PacketType::SetRequest);
        self.transact(node.address, frame, &criteria)?;
        Ok(())
    }

    // === Alerts & Stats ===

    /// Channel of values nodes push on their own
    ///
    /// Bounded by `alert_queue_depth`; when the subscriber falls behind,
    /// new alerts are dropped and counted in [`TarangIO::stats`].
    pub fn alerts(&self) -> Receiver<DataAlert> {
        self.alerts.clone()
    }

    /// Traffic counters for this session
    pub fn stats(&self) -> SessionStats {
        self.counters.snapshot()
    }

    // === Internals ===

    /// Send one request frame and wait for its outcome
    fn transact(
        &self,
        dest: NodeAddress,
        frame: Vec<u8>,
        criteria: &RequestCriteria,
    ) -> Result<Vec<u8>> {
        self.ensure_running()?;
        self.transport.lock().send(dest, &frame)?;
        self.counters.requests_sent.fetch_add(1, Ordering::Relaxed);

        let result = matcher::await_response(&self.mailbox, criteria, self.config.response_timeout());
        match &result {
            Err(Error::Nack { .. }) => {
                self.counters.nacks_received.fetch_add(1, Ordering::Relaxed);
            }
            Err(Error::Timeout { .. }) => {
                self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        result
    }

    fn ensure_running(&self) -> Result<()> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(Error::NotStarted);
        }
        Ok(())
    }
}

impl Drop for TarangIO {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("TarangIO: Failed to halt radio on drop: {e}");
        }
    }
}
