//! Relay orchestration
//!
//! The [`RelaySupervisor`] owns one stream client per subscription and feeds
//! each one's events through a [`Dispatcher`].

pub mod dispatch;
pub mod supervisor;

pub use dispatch::{DispatchReport, Dispatcher};
pub use supervisor::RelaySupervisor;
