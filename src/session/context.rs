//! Subscription identity
//!
//! The immutable identity a stream connection is created from.

use std::fmt;

use crate::error::ConfigError;

/// One configured upstream notification source
#[derive(Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Configuration key; also names the continuation cursor
    pub key: String,

    /// Upstream source id
    pub source_id: u64,

    /// Bearer token for the upstream
    pub token: String,
}

impl Subscription {
    /// Create a subscription, validating the key
    ///
    /// The key must be usable as a file name: non-empty, no path separators,
    /// not `.` or `..`.
    pub fn new(
        key: impl Into<String>,
        source_id: u64,
        token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let key = key.into();

        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\', '\0']);
        if !valid {
            return Err(ConfigError::InvalidKey(key));
        }

        Ok(Self {
            key,
            source_id,
            token: token.into(),
        })
    }
}

// The token stays out of logs
impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("source_id", &self.source_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        for key in ["all", "hololive-en", "music_only", "日本"] {
            assert!(Subscription::new(key, 1, "t").is_ok(), "{key}");
        }
    }

    #[test]
    fn test_invalid_keys() {
        for key in ["", ".", "..", "a/b", "..\\x"] {
            assert!(
                matches!(Subscription::new(key, 1, "t"), Err(ConfigError::InvalidKey(_))),
                "{key:?}"
            );
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let sub = Subscription::new("all", 1, "very-secret").unwrap();
        let debug = format!("{:?}", sub);

        assert!(debug.contains("all"));
        assert!(!debug.contains("very-secret"));
    }
}
