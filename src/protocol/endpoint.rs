//! Upstream listen URL construction

use url::Url;

use super::constants::{COMPATIBLE_MARKER, LISTEN_PATH};
use crate::error::ConfigError;

/// Base endpoint of the notification service
///
/// Accepts `http(s)://` or `ws(s)://` URLs; HTTP schemes are rewritten to
/// their WebSocket counterparts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Parse and validate a base endpoint
    pub fn parse(endpoint: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let mut base = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;

        let scheme = match base.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(invalid(format!("unsupported scheme {:?}", other))),
        };
        base.set_scheme(scheme)
            .map_err(|_| invalid("cannot switch to a WebSocket scheme".into()))?;

        if base.cannot_be_a_base() || base.host_str().is_none() {
            return Err(invalid("missing host".into()));
        }

        Ok(Self { base })
    }

    /// Listen URL for one subscription, resuming at `continuation`
    pub fn listen_url(&self, source_id: u64, token: &str, continuation: i64) -> Url {
        let mut url = self.base.clone();

        let path = format!("{}/{}", self.base.path().trim_end_matches('/'), LISTEN_PATH);
        url.set_path(&path);

        url.query_pairs_mut()
            .clear()
            .append_pair("id", &source_id.to_string())
            .append_pair("compatible", COMPATIBLE_MARKER)
            .append_pair("continuation", &continuation.to_string())
            .append_pair("bearer", token);

        url
    }

    /// The normalized base URL
    pub fn base(&self) -> &Url {
        &self.base
    }
}
