//! Shared mailbox of inbound frames
//!
//! The delivery thread appends frames; caller threads scan, claim and
//! remove them. A single mutex serializes every scan so no frame can be
//! claimed twice, and a condvar wakes waiters after every push, so idle
//! waiting costs no CPU.
//!
//! The box is bounded two ways: frames that sat unclaimed longer than the
//! TTL are swept on each push, and once the capacity is reached the oldest
//! frame is dropped to make room. Both events are counted and logged.
//!
//! Link-level delivery failures are recorded beside the frames so a caller
//! waiting on the affected node can fail fast instead of running out its
//! deadline. A note recorded before a request was issued never fails that
//! request; stale notes age out with the TTL sweep.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::node::NodeAddress;
use crate::protocol::packet::InboundFrame;
use crate::stats::TrafficCounters;

/// Frame and failure storage, only ever touched under the mailbox lock
#[derive(Debug, Default)]
pub struct FrameStore {
    frames: VecDeque<InboundFrame>,
    send_failures: VecDeque<(NodeAddress, Instant)>,
}

impl FrameStore {
    /// Remove and return the first frame satisfying the predicate,
    /// leaving every other frame in arrival order
    pub fn take_first_matching<F>(&mut self, pred: F) -> Option<InboundFrame>
    where
        F: Fn(&InboundFrame) -> bool,
    {
        let index = self.frames.iter().position(pred)?;
        self.frames.remove(index)
    }

    /// Remove and return the first delivery failure for a node recorded
    /// at or after `since`
    ///
    /// Older notes belong to requests that already gave up; they are
    /// skipped here and left to the TTL sweep.
    pub fn take_send_failure(&mut self, dest: NodeAddress, since: Instant) -> Option<NodeAddress> {
        let index = self
            .send_failures
            .iter()
            .position(|(addr, recorded)| *addr == dest && *recorded >= since)?;
        self.send_failures.remove(index).map(|(addr, _)| addr)
    }

    /// Number of frames currently held
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frames are held
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Ordered, bounded store of inbound frames with blocking scans
pub struct Mailbox {
    store: Mutex<FrameStore>,
    arrivals: Condvar,
    /// Frame count limit, `None` for unbounded
    capacity: Option<usize>,
    /// Unclaimed-frame grace period, `None` to keep frames forever
    frame_ttl: Option<Duration>,
    counters: Arc<TrafficCounters>,
}

impl Mailbox {
    /// Create a mailbox with the given bounds
    pub fn new(
        capacity: Option<usize>,
        frame_ttl: Option<Duration>,
        counters: Arc<TrafficCounters>,
    ) -> Self {
        Self {
            store: Mutex::new(FrameStore::default()),
            arrivals: Condvar::new(),
            capacity,
            frame_ttl,
            counters,
        }
    }

    /// Append a frame and wake every waiter
    ///
    /// Called from the delivery thread; never blocks beyond the lock.
    /// Sweeps expired frames first, then drops the oldest frame if the
    /// box is still at capacity.
    pub fn push(&self, frame: InboundFrame) {
        let mut store = self.store.lock();
        self.sweep_expired(&mut store);
        if let Some(capacity) = self.capacity {
            while store.frames.len() >= capacity {
                if let Some(dropped) = store.frames.pop_front() {
                    self.counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
                    log::warn!(
                        "Mailbox at capacity, dropping oldest frame from {} ({:?})",
                        dropped.source,
                        dropped.packet_type()
                    );
                } else {
                    break;
                }
            }
        }
        store.frames.push_back(frame);
        drop(store);
        self.arrivals.notify_all();
    }

    /// Record a link-level delivery failure and wake every waiter
    pub fn push_send_failure(&self, dest: NodeAddress) {
        let mut store = self.store.lock();
        self.sweep_expired(&mut store);
        store.send_failures.push_back((dest, Instant::now()));
        drop(store);
        self.arrivals.notify_all();
    }

    /// Remove and return the first frame satisfying the predicate
    pub fn take_first_matching<F>(&self, pred: F) -> Option<InboundFrame>
    where
        F: Fn(&InboundFrame) -> bool,
    {
        self.store.lock().take_first_matching(pred)
    }

    /// Run `attempt` under the lock until it yields a result or the
    /// deadline passes
    ///
    /// The closure sees the store exclusively, so a scan that claims a
    /// frame and the decision to keep waiting are one atomic step; a push
    /// between scan and sleep cannot be lost. `deadline: None` waits
    /// forever. After a timed-out sleep the store is scanned once more, so
    /// a frame that arrived exactly at the deadline still wins.
    pub fn wait_for<T, F>(&self, deadline: Option<Instant>, mut attempt: F) -> Option<T>
    where
        F: FnMut(&mut FrameStore) -> Option<T>,
    {
        let mut store = self.store.lock();
        loop {
            if let Some(result) = attempt(&mut store) {
                return Some(result);
            }
            match deadline {
                Some(deadline) => {
                    if self.arrivals.wait_until(&mut store, deadline).timed_out() {
                        return attempt(&mut store);
                    }
                }
                None => self.arrivals.wait(&mut store),
            }
        }
    }

    /// Number of frames currently held
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    /// Whether no frames are held
    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Drop frames and failure notes that outlived the grace period
    fn sweep_expired(&self, store: &mut FrameStore) {
        let Some(ttl) = self.frame_ttl else {
            return;
        };
        let now = Instant::now();
        let before = store.frames.len();
        store
            .frames
            .retain(|frame| now.duration_since(frame.received_at) < ttl);
        let expired = before - store.frames.len();
        if expired > 0 {
            self.counters
                .frames_expired
                .fetch_add(expired as u64, Ordering::Relaxed);
            log::debug!("Swept {expired} unclaimed frame(s) past TTL");
        }
        store
            .send_failures
            .retain(|(_, recorded)| now.duration_since(*recorded) < ttl);
    }
}
