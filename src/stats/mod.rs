//! Connection and delivery statistics

pub mod metrics;

pub use metrics::{ConnectionStats, RelayStats, RelayStatsSnapshot};
