//! Stream client configuration

use std::time::Duration;

use crate::protocol::constants::{DEFAULT_EVENT_BUFFER, HANDSHAKE_TIMEOUT, RECONNECT_DELAY};
use crate::protocol::Endpoint;

/// Stream client configuration options
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Upstream base endpoint
    pub endpoint: Endpoint,

    /// Time allowed between open and the `ready` frame
    pub handshake_timeout: Duration,

    /// Fixed delay before each reconnect
    pub reconnect_delay: Duration,

    /// Capacity of the event channel feeding the dispatcher
    pub event_buffer: usize,
}

impl StreamConfig {
    /// Create a config with default timings
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            handshake_timeout: HANDSHAKE_TIMEOUT,
            reconnect_delay: RECONNECT_DELAY,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    /// Set handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set reconnect delay
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set event channel capacity (at least 1)
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = StreamConfig::new(endpoint());

        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.event_buffer, DEFAULT_EVENT_BUFFER);
        assert_eq!(config.endpoint.base().scheme(), "ws");
    }

    #[test]
    fn test_builder_chaining() {
        let config = StreamConfig::new(endpoint())
            .handshake_timeout(Duration::from_millis(200))
            .reconnect_delay(Duration::from_millis(50))
            .event_buffer(8);

        assert_eq!(config.handshake_timeout, Duration::from_millis(200));
        assert_eq!(config.reconnect_delay, Duration::from_millis(50));
        assert_eq!(config.event_buffer, 8);
    }

    #[test]
    fn test_event_buffer_never_zero() {
        let config = StreamConfig::new(endpoint()).event_buffer(0);
        assert_eq!(config.event_buffer, 1);
    }
}
