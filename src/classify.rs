//! Event classification
//!
//! Stateless predicates used by routing filters and presentation. The music
//! check is a keyword heuristic; misses and false hits are expected.

use crate::protocol::{VideoEventType, VideoNotification};

/// Matched against the lower-cased title as substrings
const FOLDED_KEYWORDS: &[&str] = &[
    "歌",
    "曲",
    "公式mv",
    "original mv",
    "オリジナルmv",
    "アニソン",
    "うた",
    "カバー",
    "アコギ",
    "official video",
    "불러보",
];

/// Matched against the title as-is (case-sensitive substrings)
const RAW_KEYWORDS: &[&str] = &["MV", "SING", "SONG", "VOCALOID", "ร้อง", "เพลง", "คาราโอเกะ"];

/// Matched against whole lower-cased words of the title
const WORD_KEYWORDS: &[&str] = &[
    "anisong", "sing", "singing", "sang", "song", "karaoke", "music", "cover", "covered", "piano",
    "guitar",
];

/// Whether the content can be watched right now
///
/// Scheduled and ended streams/premieres are not available.
pub fn is_available(event: &VideoNotification) -> bool {
    !matches!(
        event.event_type,
        VideoEventType::LiveEnded
            | VideoEventType::LiveScheduled
            | VideoEventType::PremiereScheduled
            | VideoEventType::PremiereEnded
    )
}

/// Whether the title looks like music content
pub fn is_music(event: &VideoNotification) -> bool {
    is_music_title(&event.video_title)
}

/// Title heuristic behind [`is_music`]
pub fn is_music_title(title: &str) -> bool {
    if RAW_KEYWORDS.iter().any(|k| title.contains(k)) {
        return true;
    }

    let folded = title.to_lowercase();
    if tokenize(&folded).any(|word| WORD_KEYWORDS.contains(&word)) {
        return true;
    }

    FOLDED_KEYWORDS.iter().any(|k| folded.contains(k))
}

/// Split into words on anything that is not alphanumeric
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}
