//! Statistics for stream connections and the relay

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-connection counters, cumulative over all reconnects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Connect attempts ever made
    pub total_attempts: u64,
    /// Successful socket opens
    pub connects: u64,
    /// `ready` frames accepted
    pub handshakes: u64,
    /// Opens that never saw a `ready` frame in time
    pub handshake_timeouts: u64,
    /// Notification events accepted
    pub events: u64,
    /// Frames dropped because they could not be decoded
    pub malformed_frames: u64,
    /// Heartbeats sent
    pub heartbeats_sent: u64,
    /// Cursor writes that failed
    pub store_failures: u64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Relay-wide delivery counters
///
/// Shared between dispatch tasks; updated lock-free.
#[derive(Debug, Default)]
pub struct RelayStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    filtered: AtomicU64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`RelayStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    /// Rule deliveries that succeeded
    pub delivered: u64,
    /// Rule deliveries that failed (resolve or send)
    pub failed: u64,
    /// Rules skipped by their filter
    pub filtered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_stats_new() {
        let stats = ConnectionStats::new();
        assert_eq!(stats.total_attempts, 0);
        assert_eq!(stats.connects, 0);
        assert_eq!(stats.events, 0);
        assert_eq!(stats.malformed_frames, 0);
    }

    #[test]
    fn test_relay_stats_snapshot() {
        let stats = RelayStats::new();
        stats.record_delivered();
        stats.record_delivered();
        stats.record_failed();
        stats.record_filtered();
        stats.record_filtered();
        stats.record_filtered();

        assert_eq!(
            stats.snapshot(),
            RelayStatsSnapshot {
                delivered: 2,
                failed: 1,
                filtered: 3,
            }
        );
    }
}
