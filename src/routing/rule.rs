//! Routing rules
//!
//! A rule is written in configuration as `"<kind>:<id>:<mode>:<style>"`,
//! e.g. `"channel:123:music_live:localized"`.

use std::fmt;
use std::str::FromStr;

use crate::classify::is_music;
use crate::error::ConfigError;
use crate::protocol::{VideoEventType, VideoNotification};

/// Kind of recipient a rule delivers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipientKind {
    /// Direct message to a user
    User,
    /// Message in a group channel
    Channel,
}

impl RecipientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientKind::User => "user",
            RecipientKind::Channel => "channel",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "user" => Some(RecipientKind::User),
            "channel" => Some(RecipientKind::Channel),
            _ => None,
        }
    }
}

impl fmt::Display for RecipientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which events a rule lets through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Every event
    All,
    /// Watchable music: live/premiere started or uploaded
    Music,
    /// Music livestreams, scheduled or started
    MusicLive,
    /// Music premieres, scheduled or started, and uploads
    MusicNormal,
    /// Anything watchable: live/premiere started or uploaded
    Available,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Music => "music",
            FilterMode::MusicLive => "music_live",
            FilterMode::MusicNormal => "music_normal",
            FilterMode::Available => "available",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "all" => Some(FilterMode::All),
            "music" => Some(FilterMode::Music),
            "music_live" => Some(FilterMode::MusicLive),
            "music_normal" => Some(FilterMode::MusicNormal),
            "available" => Some(FilterMode::Available),
            _ => None,
        }
    }

    /// Whether the mode additionally requires a music title
    pub fn requires_music(&self) -> bool {
        matches!(
            self,
            FilterMode::Music | FilterMode::MusicLive | FilterMode::MusicNormal
        )
    }

    /// Evaluate the filter for an event
    pub fn passes(&self, event: &VideoNotification) -> bool {
        use VideoEventType::*;

        let type_matches = match self {
            FilterMode::All => return true,
            FilterMode::MusicLive => matches!(event.event_type, LiveScheduled | LiveStarted),
            FilterMode::MusicNormal => matches!(
                event.event_type,
                PremiereScheduled | PremiereStarted | Uploaded
            ),
            // `available` shares the type clause with `music` but has no music gate
            FilterMode::Music | FilterMode::Available => {
                matches!(event.event_type, LiveStarted | PremiereStarted | Uploaded)
            }
        };

        type_matches && (!self.requires_music() || is_music(event))
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the delivered message is worded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationStyle {
    /// Footer shows the raw lifecycle type
    Raw,
    /// Footer uses the localized (Thai) phrase table
    Localized,
}

impl PresentationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationStyle::Raw => "raw",
            PresentationStyle::Localized => "localized",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "raw" => Some(PresentationStyle::Raw),
            "localized" | "th" => Some(PresentationStyle::Localized),
            _ => None,
        }
    }
}

impl fmt::Display for PresentationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delivery rule of a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    /// Platform id of the recipient
    pub recipient_id: String,

    /// User or channel
    pub recipient_kind: RecipientKind,

    /// Event filter
    pub filter_mode: FilterMode,

    /// Message wording
    pub presentation_style: PresentationStyle,
}

impl RoutingRule {
    /// Whether this rule delivers the event
    pub fn passes(&self, event: &VideoNotification) -> bool {
        self.filter_mode.passes(event)
    }
}

impl FromStr for RoutingRule {
    type Err = ConfigError;

    fn from_str(rule: &str) -> Result<Self, Self::Err> {
        let mut groups = rule.splitn(4, ':');

        let mut next = |field: &'static str| {
            groups
                .next()
                .filter(|g| !g.is_empty())
                .ok_or_else(|| ConfigError::MissingField {
                    rule: rule.to_string(),
                    field,
                })
        };

        let kind = next("recipient kind")?;
        let id = next("recipient id")?;
        let mode = next("filter mode")?;
        let style = next("presentation style")?;

        let unknown = |field: &'static str, token: &str| ConfigError::UnknownToken {
            rule: rule.to_string(),
            field,
            token: token.to_string(),
        };

        Ok(Self {
            recipient_id: id.to_string(),
            recipient_kind: RecipientKind::parse(kind)
                .ok_or_else(|| unknown("recipient kind", kind))?,
            filter_mode: FilterMode::parse(mode).ok_or_else(|| unknown("filter mode", mode))?,
            presentation_style: PresentationStyle::parse(style)
                .ok_or_else(|| unknown("presentation style", style))?,
        })
    }
}

impl fmt::Display for RoutingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.recipient_kind, self.recipient_id, self.filter_mode, self.presentation_style
        )
    }
}
