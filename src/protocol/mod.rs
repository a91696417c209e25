//! Upstream notification protocol
//!
//! The notification service speaks JSON text frames over a WebSocket. This
//! module holds the message shapes, the listen URL builder and the timing
//! constants the stream client relies on.

pub mod constants;
pub mod endpoint;
pub mod message;

pub use endpoint::Endpoint;
pub use message::{
    HeartbeatPayload, LiveStreamingDetail, Payload, ReadyPayload, Thumbnails, VideoEventType,
    VideoNotification,
};
