//! Upstream stream client
//!
//! Provides the per-subscription WebSocket client that:
//! - Resumes from the stored continuation cursor
//! - Waits for the `ready` handshake and keeps heartbeats running
//! - Reconnects forever after a fixed delay

pub mod config;
pub mod stream;

pub use config::StreamConfig;
pub use stream::NotifyStream;
