//! Protocol constants

use std::time::Duration;

/// Time allowed between socket open and the `ready` frame
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed delay before every reconnect attempt
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the per-subscription event channel
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Path of the listen endpoint, appended to the configured base URL
pub const LISTEN_PATH: &str = "notifications/listen";

/// Value of the `compatible` query parameter
pub const COMPATIBLE_MARKER: &str = "notifier";

/// Canonical short watch URL prefix
pub const WATCH_URL_PREFIX: &str = "https://youtu.be/";

/// Channel page URL prefix
pub const CHANNEL_URL_PREFIX: &str = "https://www.youtube.com/channel/";

/// Icon shown in every presentation footer
pub const FOOTER_ICON_URL: &str = "https://i.imgur.com/DreZpdG.png";

/// Embed color for events whose content can be watched now
pub const COLOR_AVAILABLE: u32 = 0xFF0000;

/// Embed color for scheduled or ended events
pub const COLOR_UNAVAILABLE: u32 = 0x242424;
