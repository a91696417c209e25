//! Relay configuration
//!
//! Loaded from a TOML file, then overridden by `NOTIFY_RELAY__*` environment
//! variables (`__` separates nested keys, e.g.
//! `NOTIFY_RELAY__STREAM__RECONNECT_DELAY_MS=500`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

use crate::client::StreamConfig;
use crate::delivery::DiscordConfig;
use crate::error::ConfigError;
use crate::protocol::constants::{DEFAULT_EVENT_BUFFER, HANDSHAKE_TIMEOUT, RECONNECT_DELAY};
use crate::protocol::Endpoint;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "NOTIFY_RELAY";

/// Top-level relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Upstream base URL (`http(s)` or `ws(s)`)
    pub endpoint: String,

    /// Directory holding one cursor file per subscription
    #[serde(default = "default_continuation_dir")]
    pub continuation_dir: PathBuf,

    /// Discord bot settings; required unless running dry
    #[serde(default)]
    pub discord: Option<DiscordSettings>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub stream: StreamSettings,

    /// Subscriptions by key
    #[serde(default)]
    pub notifications: BTreeMap<String, NotificationConfig>,
}

/// `[discord]` section
#[derive(Clone, Deserialize)]
pub struct DiscordSettings {
    /// Bot token
    pub token: String,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for DiscordSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordSettings")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `notify_relay=debug`
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Append to this file instead of stdout
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

/// `[stream]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub handshake_timeout_ms: u64,
    pub reconnect_delay_ms: u64,
    pub event_buffer: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: HANDSHAKE_TIMEOUT.as_millis() as u64,
            reconnect_delay_ms: RECONNECT_DELAY.as_millis() as u64,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// `[notifications.<key>]` section
#[derive(Clone, Deserialize)]
pub struct NotificationConfig {
    /// Upstream source id
    pub id: u64,
    /// Bearer token for the upstream
    pub token: String,
    /// Routing rule strings
    #[serde(default)]
    pub send: Vec<String>,
}

impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .field("send", &self.send)
            .finish()
    }
}

fn default_continuation_dir() -> PathBuf {
    PathBuf::from("continuation")
}

impl RelayConfig {
    /// Load from an optional file plus the environment
    ///
    /// A path that is given but does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse a TOML document, without environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Stream client settings for every subscription
    pub fn stream_config(&self) -> Result<StreamConfig, ConfigError> {
        let endpoint = Endpoint::parse(&self.endpoint)?;

        Ok(StreamConfig::new(endpoint)
            .handshake_timeout(Duration::from_millis(self.stream.handshake_timeout_ms))
            .reconnect_delay(Duration::from_millis(self.stream.reconnect_delay_ms))
            .event_buffer(self.stream.event_buffer))
    }

    /// Discord client settings, if a `[discord]` section is present
    pub fn discord_config(&self) -> Option<DiscordConfig> {
        let settings = self.discord.as_ref()?;

        let mut config = DiscordConfig::new(settings.token.clone());
        if let Some(ref base) = settings.api_base {
            config = config.api_base(base.clone());
        }
        if let Some(ref agent) = settings.user_agent {
            config = config.user_agent(agent.clone());
        }
        Some(config)
    }
}
