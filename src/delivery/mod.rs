//! Delivery to chat recipients
//!
//! A [`DeliveryPlatform`] knows how to look up a recipient and post a
//! rendered [`Presentation`](crate::routing::Presentation) to it. The
//! [`DeliverySink`] in front of it caches resolved recipients.

pub mod discord;
pub mod log;
pub mod sink;

use std::fmt;

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::routing::{Presentation, RecipientKind};

pub use discord::{DiscordConfig, DiscordPlatform};
pub use log::LogPlatform;
pub use sink::DeliverySink;

/// A resolved recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// User or channel
    pub kind: RecipientKind,

    /// Recipient id from the routing rule
    pub id: String,

    /// Channel messages are posted to (the DM channel for users)
    pub channel_id: String,

    /// Name used in log lines
    pub display_name: String,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RecipientKind::Channel => write!(f, "[{}] {}", self.id, self.display_name),
            RecipientKind::User => f.write_str(&self.display_name),
        }
    }
}

/// Messaging platform capabilities the relay consumes
#[async_trait]
pub trait DeliveryPlatform: Send + Sync {
    /// Look up a recipient on the platform
    async fn fetch_target(&self, kind: RecipientKind, id: &str) -> Result<Target, DeliveryError>;

    /// Post a message to a resolved recipient
    async fn send(&self, target: &Target, presentation: &Presentation) -> Result<(), DeliveryError>;
}
