//! Upstream message types
//!
//! Every frame is a JSON object discriminated by its `op` field:
//!
//! ```text
//! Client                                   Server
//!   |                                        |
//!   |------- open (id, continuation) ------>|
//!   |<------ {op:"ready", heartbeat...} ----|
//!   |------- {op:"heartbeat"} (interval) -->|
//!   |<------ {op:"youtubeVideoNotify"} -----|
//!   |<------ {op:"youtubeVideoNotify"} -----|
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// A decoded upstream frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Payload {
    /// Handshake, sent once by the server after open
    Ready(ReadyPayload),

    /// Keep-alive, sent by the client
    Heartbeat(HeartbeatPayload),

    /// Video or livestream state change
    YoutubeVideoNotify(VideoNotification),

    /// Any op this client does not understand
    #[serde(other)]
    Unknown,
}

impl Payload {
    /// Decode a text frame
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode for sending as a text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Heartbeat stamped with the current time
    pub fn heartbeat_now() -> Self {
        Payload::Heartbeat(HeartbeatPayload {
            timestamp: Utc::now().timestamp_millis(),
        })
    }
}

/// Handshake parameters issued by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPayload {
    pub connection_id: String,
    pub trace_id: String,
    pub user_id: String,
    /// Milliseconds between client heartbeats
    pub heartbeat_interval: u64,
    /// Milliseconds after which the server drops a silent client
    pub heartbeat_timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub timestamp: i64,
}

/// Lifecycle type of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoEventType {
    Uploaded,
    LiveScheduled,
    LiveStarted,
    LiveEnded,
    PremiereScheduled,
    PremiereStarted,
    PremiereEnded,
}

impl VideoEventType {
    /// Wire name, also used as the raw footer text
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoEventType::Uploaded => "uploaded",
            VideoEventType::LiveScheduled => "liveScheduled",
            VideoEventType::LiveStarted => "liveStarted",
            VideoEventType::LiveEnded => "liveEnded",
            VideoEventType::PremiereScheduled => "premiereScheduled",
            VideoEventType::PremiereStarted => "premiereStarted",
            VideoEventType::PremiereEnded => "premiereEnded",
        }
    }

    /// Fixed-width code used in delivery log lines
    pub fn short_code(&self) -> &'static str {
        match self {
            VideoEventType::LiveScheduled => "LIVE +",
            VideoEventType::LiveStarted => "LIVE *",
            VideoEventType::LiveEnded => "LIVE -",
            VideoEventType::PremiereScheduled => "PREM +",
            VideoEventType::PremiereStarted => "PREM *",
            VideoEventType::PremiereEnded => "PREM -",
            VideoEventType::Uploaded => "UPLD  ",
        }
    }
}

impl fmt::Display for VideoEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thumbnail URLs by resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thumbnails {
    pub default: Option<String>,
    pub medium: Option<String>,
    pub high: Option<String>,
    pub standard: Option<String>,
    pub max_res: Option<String>,
}

/// Timing of a livestream or premiere
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveStreamingDetail {
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub scheduled_end_time: Option<DateTime<Utc>>,
}

/// A video/livestream change event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoNotification {
    /// Set for synthetic notifications sent by the upstream for testing
    #[serde(default)]
    pub is_test: Option<bool>,

    pub video_id: String,

    pub video_title: String,

    pub channel_id: String,

    pub channel_title: String,

    #[serde(default)]
    pub channel_icon: Option<String>,

    #[serde(default)]
    pub thumbnails: Thumbnails,

    #[serde(default)]
    pub live_streaming_detail: Option<LiveStreamingDetail>,

    #[serde(rename = "type")]
    pub event_type: VideoEventType,

    /// Properties whose change triggered the notification
    #[serde(default)]
    pub triggered_properties: Option<Vec<String>>,

    /// Upstream event time in milliseconds; becomes the continuation cursor
    pub timestamp: i64,
}

impl VideoNotification {
    /// Whether this is a test notification
    pub fn is_test(&self) -> bool {
        self.is_test.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ready() {
        let text = r#"{"op":"ready","connectionId":"c1","traceId":"t1","userId":"u1","heartbeatInterval":30000,"heartbeatTimeout":60000}"#;

        match Payload::decode(text).unwrap() {
            Payload::Ready(ready) => {
                assert_eq!(ready.connection_id, "c1");
                assert_eq!(ready.user_id, "u1");
                assert_eq!(ready.heartbeat_interval, 30000);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_decode_notification() {
        let text = r#"{
            "op": "youtubeVideoNotify",
            "isTest": null,
            "videoId": "abc123",
            "videoTitle": "New Song",
            "channelId": "UC1",
            "channelTitle": "Someone",
            "channelIcon": "https://example.com/icon.png",
            "thumbnails": {"default": "https://example.com/d.jpg", "high": null},
            "liveStreamingDetail": {"scheduledStartTime": "2024-05-01T12:00:00Z", "concurrentViewers": null},
            "type": "liveScheduled",
            "triggeredProperties": ["status"],
            "timestamp": 1714560000000
        }"#;

        let Payload::YoutubeVideoNotify(event) = Payload::decode(text).unwrap() else {
            panic!("expected notification");
        };

        assert_eq!(event.video_id, "abc123");
        assert_eq!(event.event_type, VideoEventType::LiveScheduled);
        assert!(!event.is_test());
        assert_eq!(event.timestamp, 1714560000000);
        assert!(event.thumbnails.high.is_none());

        let detail = event.live_streaming_detail.unwrap();
        assert_eq!(
            detail.scheduled_start_time.unwrap().to_rfc3339(),
            "2024-05-01T12:00:00+00:00"
        );
        assert!(detail.actual_start_time.is_none());
    }

    #[test]
    fn test_unknown_op_is_not_an_error() {
        let payload = Payload::decode(r#"{"op":"somethingNew","x":1}"#).unwrap();
        assert_eq!(payload, Payload::Unknown);
    }

    #[test]
    fn test_malformed_frames() {
        assert!(Payload::decode("not json").is_err());
        assert!(Payload::decode(r#"{"op":"youtubeVideoNotify","videoId":"x"}"#).is_err());
        assert!(Payload::decode(r#"{"op":"ready","connectionId":"c"}"#).is_err());
    }

    #[test]
    fn test_heartbeat_encoding() {
        let text = Payload::Heartbeat(HeartbeatPayload { timestamp: 42 })
            .encode()
            .unwrap();
        assert_eq!(text, r#"{"op":"heartbeat","timestamp":42}"#);
    }

    #[test]
    fn test_event_type_wire_names() {
        let parsed: VideoEventType = serde_json::from_str("\"premiereEnded\"").unwrap();
        assert_eq!(parsed, VideoEventType::PremiereEnded);
        assert_eq!(VideoEventType::Uploaded.to_string(), "uploaded");
        assert_eq!(VideoEventType::LiveStarted.short_code(), "LIVE *");
    }
}
