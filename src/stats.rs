//! Session traffic counters
//!
//! All fields use atomic types so the delivery thread and caller threads
//! update them without taking a lock. Snapshots are taken field by field
//! and are not mutually consistent, which is fine for health reporting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the delivery path, the mailbox and the facade
///
/// # Fields
///
/// - `frames_received`: Frame bodies handed over by the transport
/// - `frames_expired`: Frames swept after sitting unclaimed past the TTL
/// - `frames_dropped`: Oldest frames discarded because the mailbox was full
/// - `unknown_frames`: Bodies with an empty or unrecognized type byte
/// - `alerts_dropped`: Data alerts discarded because the subscriber lagged
/// - `requests_sent`: Request frames handed to the transport
/// - `nacks_received`: Requests rejected by a node
/// - `timeouts`: Waits that expired without a qualifying frame
/// - `send_failures`: Delivery failures reported by the link layer
#[derive(Debug, Default)]
pub struct TrafficCounters {
    pub frames_received: AtomicU64,
    pub frames_expired: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub unknown_frames: AtomicU64,
    pub alerts_dropped: AtomicU64,
    pub requests_sent: AtomicU64,
    pub nacks_received: AtomicU64,
    pub timeouts: AtomicU64,
    pub send_failures: AtomicU64,
}

impl TrafficCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_expired: self.frames_expired.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            unknown_frames: self.unknown_frames.load(Ordering::Relaxed),
            alerts_dropped: self.alerts_dropped.load(Ordering::Relaxed),
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            nacks_received: self.nacks_received.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of session traffic, as returned by `TarangIO::stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Frame bodies handed over by the transport
    pub frames_received: u64,
    /// Frames swept after sitting unclaimed past the TTL
    pub frames_expired: u64,
    /// Oldest frames discarded because the mailbox was full
    pub frames_dropped: u64,
    /// Bodies with an empty or unrecognized type byte
    pub unknown_frames: u64,
    /// Data alerts discarded because the subscriber lagged
    pub alerts_dropped: u64,
    /// Request frames handed to the transport
    pub requests_sent: u64,
    /// Requests rejected by a node
    pub nacks_received: u64,
    /// Waits that expired without a qualifying frame
    pub timeouts: u64,
    /// Delivery failures reported by the link layer
    pub send_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counts() {
        let counters = TrafficCounters::new();
        counters.frames_received.fetch_add(2, Ordering::Relaxed);
        counters.frames_expired.fetch_add(3, Ordering::Relaxed);
        let stats = counters.snapshot();
        assert_eq!(stats.frames_received, 2);
        assert_eq!(stats.frames_expired, 3);
        assert_eq!(stats.timeouts, 0);
    }
}
