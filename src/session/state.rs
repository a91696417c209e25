//! Connection state machine
//!
//! Tracks one subscription's upstream connection across reconnects.
//!
//! ```text
//!                 begin_connect        opened           on_ready
//!  Disconnected ─────────────► Connecting ──► AwaitingHandshake ──► Live
//!       ▲                          │                  │              │
//!       └──────────────────────────┴──── closed ──────┴──────────────┘
//! ```

use std::time::{Duration, Instant};

use crate::protocol::ReadyPayload;
use crate::stats::ConnectionStats;

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No socket; a reconnect may be pending
    Disconnected,
    /// Socket open in progress
    Connecting,
    /// Socket open, waiting for the `ready` frame
    AwaitingHandshake,
    /// Handshake done, heartbeats running
    Live,
}

/// Complete connection state
#[derive(Debug)]
pub struct ConnectionState {
    /// Subscription key
    pub key: String,

    /// Current phase
    pub phase: ConnectionPhase,

    /// Connect attempts since the last successful open
    pub attempts: u32,

    /// Continuation cursor (last accepted event time)
    pub cursor: i64,

    /// Server-issued connection id (after handshake)
    pub connection_id: Option<String>,

    /// Server-issued heartbeat interval (after handshake)
    pub heartbeat_interval: Option<Duration>,

    /// Time the current socket opened
    pub connected_at: Option<Instant>,

    /// Time the current socket went live
    pub live_at: Option<Instant>,

    /// Cumulative counters
    pub stats: ConnectionStats,
}

impl ConnectionState {
    /// Create a disconnected state resuming at `cursor`
    pub fn new(key: impl Into<String>, cursor: i64) -> Self {
        Self {
            key: key.into(),
            phase: ConnectionPhase::Disconnected,
            attempts: 0,
            cursor,
            connection_id: None,
            heartbeat_interval: None,
            connected_at: None,
            live_at: None,
            stats: ConnectionStats::new(),
        }
    }

    /// Start a connect attempt
    ///
    /// Returns false (and changes nothing) unless disconnected.
    pub fn begin_connect(&mut self) -> bool {
        if self.phase != ConnectionPhase::Disconnected {
            return false;
        }

        self.phase = ConnectionPhase::Connecting;
        self.attempts += 1;
        self.stats.total_attempts += 1;
        true
    }

    /// Socket opened, handshake timeout starts
    pub fn opened(&mut self) {
        if self.phase == ConnectionPhase::Connecting {
            self.phase = ConnectionPhase::AwaitingHandshake;
            self.attempts = 0;
            self.connected_at = Some(Instant::now());
            self.stats.connects += 1;
        }
    }

    /// Handle the `ready` frame
    ///
    /// Returns true if the connection went live; a `ready` in any other
    /// phase is ignored.
    pub fn on_ready(&mut self, ready: &ReadyPayload) -> bool {
        if self.phase != ConnectionPhase::AwaitingHandshake {
            return false;
        }

        self.phase = ConnectionPhase::Live;
        self.connection_id = Some(ready.connection_id.clone());
        self.heartbeat_interval =
            Some(Duration::from_millis(ready.heartbeat_interval)).filter(|d| !d.is_zero());
        self.live_at = Some(Instant::now());
        self.stats.handshakes += 1;
        true
    }

    /// Record an accepted event and return the new cursor
    ///
    /// The cursor never moves backwards.
    pub fn advance_cursor(&mut self, timestamp: i64) -> i64 {
        self.cursor = self.cursor.max(timestamp);
        self.stats.events += 1;
        self.cursor
    }

    /// Socket closed or failed
    ///
    /// Returns true if the connection was not already disconnected, i.e. a
    /// reconnect must be scheduled.
    pub fn closed(&mut self) -> bool {
        if self.phase == ConnectionPhase::Disconnected {
            return false;
        }

        self.phase = ConnectionPhase::Disconnected;
        self.connection_id = None;
        self.heartbeat_interval = None;
        self.connected_at = None;
        self.live_at = None;
        true
    }

    /// Check if the handshake completed on the current socket
    pub fn is_live(&self) -> bool {
        self.phase == ConnectionPhase::Live
    }

    /// How long the current socket has been open
    pub fn uptime(&self) -> Option<Duration> {
        self.connected_at.map(|t| t.elapsed())
    }

    /// Copy for publishing to observers
    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            key: self.key.clone(),
            phase: self.phase,
            attempts: self.attempts,
            cursor: self.cursor,
            connection_id: self.connection_id.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// Observable view of a [`ConnectionState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub key: String,
    pub phase: ConnectionPhase,
    pub attempts: u32,
    pub cursor: i64,
    pub connection_id: Option<String>,
    pub stats: ConnectionStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(interval: u64) -> ReadyPayload {
        ReadyPayload {
            connection_id: "conn-1".into(),
            trace_id: "trace".into(),
            user_id: "user".into(),
            heartbeat_interval: interval,
            heartbeat_timeout: interval * 2,
        }
    }

    #[test]
    fn test_connection_lifecycle() {
        let mut state = ConnectionState::new("all", 100);
        assert_eq!(state.phase, ConnectionPhase::Disconnected);

        assert!(state.begin_connect());
        assert_eq!(state.phase, ConnectionPhase::Connecting);
        assert_eq!(state.attempts, 1);

        state.opened();
        assert_eq!(state.phase, ConnectionPhase::AwaitingHandshake);
        assert_eq!(state.attempts, 0);
        assert!(state.uptime().is_some());

        assert!(state.on_ready(&ready(30_000)));
        assert_eq!(state.phase, ConnectionPhase::Live);
        assert!(state.is_live());
        assert_eq!(state.heartbeat_interval, Some(Duration::from_secs(30)));
        assert_eq!(state.connection_id.as_deref(), Some("conn-1"));

        assert!(state.closed());
        assert_eq!(state.phase, ConnectionPhase::Disconnected);
        assert!(state.heartbeat_interval.is_none());
        assert!(state.connection_id.is_none());

        assert_eq!(state.stats.total_attempts, 1);
        assert_eq!(state.stats.connects, 1);
        assert_eq!(state.stats.handshakes, 1);
    }

    #[test]
    fn test_connect_failure_counts_attempts() {
        let mut state = ConnectionState::new("all", 0);

        for expected in 1..=3 {
            assert!(state.begin_connect());
            assert_eq!(state.attempts, expected);
            assert!(state.closed());
        }

        state.begin_connect();
        state.opened();
        assert_eq!(state.attempts, 0);
        assert_eq!(state.stats.total_attempts, 4);
    }

    #[test]
    fn test_begin_connect_only_when_disconnected() {
        let mut state = ConnectionState::new("all", 0);
        assert!(state.begin_connect());
        assert!(!state.begin_connect());
        assert_eq!(state.attempts, 1);
    }

    #[test]
    fn test_close_while_disconnected_schedules_nothing() {
        let mut state = ConnectionState::new("all", 0);
        assert!(!state.closed());
    }

    #[test]
    fn test_ready_ignored_unless_awaiting() {
        let mut state = ConnectionState::new("all", 0);
        assert!(!state.on_ready(&ready(1000)));

        state.begin_connect();
        state.opened();
        assert!(state.on_ready(&ready(1000)));
        // Duplicate ready on a live connection
        assert!(!state.on_ready(&ready(5000)));
        assert_eq!(state.heartbeat_interval, Some(Duration::from_secs(1)));
        assert_eq!(state.stats.handshakes, 1);
    }

    #[test]
    fn test_zero_interval_disables_heartbeat() {
        let mut state = ConnectionState::new("all", 0);
        state.begin_connect();
        state.opened();

        assert!(state.on_ready(&ready(0)));
        assert!(state.is_live());
        assert!(state.heartbeat_interval.is_none());
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let mut state = ConnectionState::new("all", 1_000);

        assert_eq!(state.advance_cursor(1_500), 1_500);
        assert_eq!(state.advance_cursor(1_200), 1_500);
        assert_eq!(state.advance_cursor(2_000), 2_000);
        assert_eq!(state.stats.events, 3);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.cursor, 2_000);
        assert_eq!(snapshot.key, "all");
    }
}
