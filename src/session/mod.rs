//! Subscription identity and connection state

pub mod context;
pub mod state;

pub use context::Subscription;
pub use state::{ConnectionPhase, ConnectionSnapshot, ConnectionState};
