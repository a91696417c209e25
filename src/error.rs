//! Error types
//!
//! Each concern has its own error enum; [`Error`] unifies them for the
//! crate-level [`Result`] alias.

use std::io;

/// Crate-level result type
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Upstream connection failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Malformed upstream frame
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Continuation store failure
    #[error("continuation store error: {0}")]
    Continuation(#[from] ContinuationError),

    /// Delivery failure
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Failures of the upstream WebSocket connection
///
/// These are always recovered by reconnecting.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not open the socket
    #[error("connect failed: {0}")]
    Connect(String),

    /// No `ready` frame within the handshake timeout
    #[error("no handshake within {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// Socket closed or errored while open
    #[error("connection closed: {0}")]
    Closed(String),
}

/// A single upstream frame could not be decoded
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON for any known message shape
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Configuration problems, fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Routing rule string does not have four `:`-separated groups
    #[error("routing rule {rule:?} is missing the {field} group")]
    MissingField {
        /// Offending rule string
        rule: String,
        /// Name of the missing group
        field: &'static str,
    },

    /// Routing rule string has an unknown token
    #[error("routing rule {rule:?} has unknown {field} {token:?}")]
    UnknownToken {
        /// Offending rule string
        rule: String,
        /// Field the token was found in
        field: &'static str,
        /// The unknown token
        token: String,
    },

    /// Subscription key cannot be used as a cursor file name
    #[error("invalid subscription key {0:?}")]
    InvalidKey(String),

    /// Two subscriptions share a key
    #[error("duplicate subscription key {0:?}")]
    DuplicateKey(String),

    /// Logging could not be set up
    #[error("logging: {0}")]
    Logging(String),

    /// Endpoint URL cannot be used for the upstream WebSocket
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// Configured endpoint
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },

    /// Loading or deserializing the configuration failed
    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

/// Continuation store failures
#[derive(Debug, thiserror::Error)]
pub enum ContinuationError {
    /// Underlying storage failed
    #[error("I/O error for {key:?}: {source}")]
    Io {
        /// Subscription key
        key: String,
        /// Cause
        #[source]
        source: io::Error,
    },

    /// Stored value is not an integer
    #[error("corrupt cursor for {key:?}: {value:?}")]
    Corrupt {
        /// Subscription key
        key: String,
        /// Raw stored value
        value: String,
    },
}

/// Failures resolving a recipient or sending to it
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeliveryError {
    /// Recipient does not exist (or is not visible to the bot)
    #[error("recipient not found")]
    NotFound,

    /// Platform refused the operation
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Platform answered with another non-success status
    #[error("rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body (truncated by the platform client)
        body: String,
    },

    /// Network failure talking to the platform
    #[error("transport failure: {0}")]
    Transport(String),

    /// Platform answered with a body that could not be parsed
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl DeliveryError {
    /// Whether a cached handle for this recipient should be dropped
    pub fn invalidates_cache(&self) -> bool {
        matches!(self, DeliveryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnknownToken {
            rule: "group:1:all:raw".into(),
            field: "recipient kind",
            token: "group".into(),
        };
        assert_eq!(
            err.to_string(),
            "routing rule \"group:1:all:raw\" has unknown recipient kind \"group\""
        );
    }

    #[test]
    fn test_only_not_found_invalidates() {
        assert!(DeliveryError::NotFound.invalidates_cache());
        assert!(!DeliveryError::Forbidden("missing access".into()).invalidates_cache());
        assert!(!DeliveryError::Transport("reset".into()).invalidates_cache());
        assert!(!DeliveryError::Decode("eof".into()).invalidates_cache());
    }
}
