//! Rendering an event for delivery
//!
//! The presentation is platform-neutral; the Discord platform maps it onto
//! a single embed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::rule::PresentationStyle;
use crate::classify::is_available;
use crate::protocol::constants::{
    CHANNEL_URL_PREFIX, COLOR_AVAILABLE, COLOR_UNAVAILABLE, FOOTER_ICON_URL, WATCH_URL_PREFIX,
};
use crate::protocol::{VideoEventType, VideoNotification};

/// Author block (the uploading channel)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub name: String,
    pub url: String,
    pub icon_url: Option<String>,
}

/// Footer block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footer {
    pub text: String,
    pub icon_url: String,
}

/// Display bundle handed to a delivery sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub title: String,
    /// Canonical watch URL
    pub url: String,
    pub color: u32,
    /// Time the event refers to (scheduled start, actual start/end, or now)
    pub timestamp: DateTime<Utc>,
    pub author: Author,
    pub footer: Footer,
    pub thumbnail: Option<String>,
}

impl Presentation {
    /// Render `event` in `style`, using `now` for events without a
    /// type-specific time
    pub fn render(event: &VideoNotification, style: PresentationStyle, now: DateTime<Utc>) -> Self {
        let footer_text = match style {
            PresentationStyle::Raw => raw_footer(event),
            PresentationStyle::Localized => localized_footer(event),
        };

        Self {
            title: event.video_title.clone(),
            url: format!("{}{}", WATCH_URL_PREFIX, event.video_id),
            color: if is_available(event) {
                COLOR_AVAILABLE
            } else {
                COLOR_UNAVAILABLE
            },
            timestamp: event_time(event).unwrap_or(now),
            author: Author {
                name: event.channel_title.clone(),
                url: format!("{}{}", CHANNEL_URL_PREFIX, event.channel_id),
                icon_url: event.channel_icon.clone(),
            },
            footer: Footer {
                text: footer_text,
                icon_url: FOOTER_ICON_URL.to_string(),
            },
            thumbnail: event
                .thumbnails
                .high
                .clone()
                .or_else(|| event.thumbnails.default.clone()),
        }
    }
}

/// Type-specific time from the live streaming detail, if present
fn event_time(event: &VideoNotification) -> Option<DateTime<Utc>> {
    let detail = event.live_streaming_detail.as_ref()?;

    match event.event_type {
        VideoEventType::LiveScheduled | VideoEventType::PremiereScheduled => {
            detail.scheduled_start_time
        }
        VideoEventType::LiveStarted | VideoEventType::PremiereStarted => detail.actual_start_time,
        VideoEventType::LiveEnded | VideoEventType::PremiereEnded => detail.actual_end_time,
        VideoEventType::Uploaded => None,
    }
}

fn raw_footer(event: &VideoNotification) -> String {
    let prefix = if event.is_test() { "[TEST] " } else { "" };
    format!("{}{}", prefix, event.event_type)
}

fn localized_footer(event: &VideoNotification) -> String {
    let prefix = if event.is_test() { "[ทดสอบ] " } else { "" };
    let phrase = match event.event_type {
        VideoEventType::LiveStarted => "แจ้งเตือนไลฟ์",
        VideoEventType::PremiereStarted => "แจ้งเตือนเปิดตัวคลิป",
        _ => "แจ้งเตือนอัปโหลด",
    };
    format!("{}{}", prefix, phrase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{LiveStreamingDetail, Thumbnails};
    use chrono::TimeZone;

    fn event(event_type: VideoEventType) -> VideoNotification {
        VideoNotification {
            is_test: Some(false),
            video_id: "dQw4w9WgXcQ".into(),
            video_title: "New Song".into(),
            channel_id: "UCabc".into(),
            channel_title: "Singer".into(),
            channel_icon: Some("https://example.com/icon.png".into()),
            thumbnails: Thumbnails {
                default: Some("https://example.com/default.jpg".into()),
                high: Some("https://example.com/high.jpg".into()),
                ..Default::default()
            },
            live_streaming_detail: Some(LiveStreamingDetail {
                scheduled_start_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
                actual_start_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 0).unwrap()),
                actual_end_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap()),
                scheduled_end_time: None,
            }),
            event_type,
            triggered_properties: None,
            timestamp: 1,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn raw(event_type: VideoEventType) -> Presentation {
        Presentation::render(&event(event_type), PresentationStyle::Raw, now())
    }

    #[test]
    fn test_raw_upload() {
        let p = raw(VideoEventType::Uploaded);

        assert_eq!(p.title, "New Song");
        assert_eq!(p.url, "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(p.color, COLOR_AVAILABLE);
        assert_eq!(p.timestamp, now());
        assert_eq!(p.footer.text, "uploaded");
        assert_eq!(p.footer.icon_url, FOOTER_ICON_URL);
        assert_eq!(p.author.name, "Singer");
        assert_eq!(p.author.url, "https://www.youtube.com/channel/UCabc");
        assert_eq!(p.thumbnail.as_deref(), Some("https://example.com/high.jpg"));
    }

    #[test]
    fn test_timestamp_by_type() {
        let scheduled = raw(VideoEventType::PremiereScheduled);
        let started = raw(VideoEventType::LiveStarted);
        let ended = raw(VideoEventType::LiveEnded);

        assert_eq!(scheduled.timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");
        assert_eq!(started.timestamp.to_rfc3339(), "2024-05-01T12:03:00+00:00");
        assert_eq!(ended.timestamp.to_rfc3339(), "2024-05-01T14:00:00+00:00");
    }

    #[test]
    fn test_missing_detail_falls_back_to_now() {
        let mut e = event(VideoEventType::LiveStarted);
        e.live_streaming_detail = None;

        let p = Presentation::render(&e, PresentationStyle::Raw, now());
        assert_eq!(p.timestamp, now());
    }

    #[test]
    fn test_unavailable_color() {
        for t in [
            VideoEventType::LiveEnded,
            VideoEventType::LiveScheduled,
            VideoEventType::PremiereScheduled,
            VideoEventType::PremiereEnded,
        ] {
            let p = Presentation::render(&event(t), PresentationStyle::Raw, now());
            assert_eq!(p.color, COLOR_UNAVAILABLE, "{t}");
        }
    }

    #[test]
    fn test_thumbnail_fallback() {
        let mut e = event(VideoEventType::Uploaded);
        e.thumbnails.high = None;
        let p = Presentation::render(&e, PresentationStyle::Raw, now());
        assert_eq!(p.thumbnail.as_deref(), Some("https://example.com/default.jpg"));

        e.thumbnails.default = None;
        let p = Presentation::render(&e, PresentationStyle::Raw, now());
        assert!(p.thumbnail.is_none());
    }

    #[test]
    fn test_test_prefix() {
        let mut e = event(VideoEventType::LiveStarted);
        e.is_test = Some(true);

        let raw = Presentation::render(&e, PresentationStyle::Raw, now());
        let localized = Presentation::render(&e, PresentationStyle::Localized, now());

        assert_eq!(raw.footer.text, "[TEST] liveStarted");
        assert_eq!(localized.footer.text, "[ทดสอบ] แจ้งเตือนไลฟ์");
    }

    #[test]
    fn test_localized_phrases() {
        let footer = |t| {
            Presentation::render(&event(t), PresentationStyle::Localized, now())
                .footer
                .text
        };

        assert_eq!(footer(VideoEventType::LiveStarted), "แจ้งเตือนไลฟ์");
        assert_eq!(footer(VideoEventType::PremiereStarted), "แจ้งเตือนเปิดตัวคลิป");
        assert_eq!(footer(VideoEventType::Uploaded), "แจ้งเตือนอัปโหลด");
        assert_eq!(footer(VideoEventType::LiveScheduled), "แจ้งเตือนอัปโหลด");
    }
}
