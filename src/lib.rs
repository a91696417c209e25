//! notify-relay
//!
//! Keeps one resilient WebSocket connection per configured notification
//! subscription, resumes each from a persisted continuation cursor, and fans
//! every video/livestream event out to chat recipients according to routing
//! rules.
//!
//! ```text
//!   upstream ──ws──► NotifyStream ──► Dispatcher ──► DeliverySink ──► Discord
//!                        │               │
//!                  ContinuationStore  RoutingTable + classify
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use notify_relay::config::RelayConfig;
//! use notify_relay::continuation::FileContinuationStore;
//! use notify_relay::delivery::LogPlatform;
//! use notify_relay::relay::RelaySupervisor;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RelayConfig::load(Some("relay.toml".as_ref()))?;
//! let store = FileContinuationStore::open(&config.continuation_dir).await?;
//!
//! let supervisor = RelaySupervisor::from_config(
//!     &config,
//!     Arc::new(store),
//!     Arc::new(LogPlatform::new()),
//! )?;
//!
//! supervisor
//!     .run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod client;
pub mod config;
pub mod continuation;
pub mod delivery;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod relay;
pub mod routing;
pub mod session;
pub mod stats;

pub use client::{NotifyStream, StreamConfig};
pub use config::RelayConfig;
pub use continuation::{ContinuationStore, FileContinuationStore, MemoryContinuationStore};
pub use delivery::{DeliveryPlatform, DeliverySink, DiscordPlatform, LogPlatform, Target};
pub use error::{Error, Result};
pub use relay::RelaySupervisor;
pub use routing::{RoutingRule, RoutingTable};
pub use session::{ConnectionPhase, Subscription};
