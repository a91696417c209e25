//! Discord REST delivery
//!
//! Users are reached through a DM channel opened on resolve; channels are
//! looked up directly. Every presentation becomes a single embed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{DeliveryPlatform, Target};
use crate::error::DeliveryError;
use crate::routing::{Presentation, RecipientKind};

/// Default REST API base
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Discord error codes that mean the recipient does not exist
const UNKNOWN_CHANNEL: u64 = 10003;
const UNKNOWN_USER: u64 = 10013;

/// Longest response body kept in an error
const MAX_ERROR_BODY: usize = 200;

/// Discord client settings
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Bot token (without the `Bot ` prefix)
    pub token: String,

    /// REST API base URL
    pub api_base: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl DiscordConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: concat!("notify-relay/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }

    /// Set API base URL
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

#[derive(Deserialize)]
struct DiscordUser {
    username: String,
}

#[derive(Deserialize)]
struct DiscordChannel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    recipients: Vec<DiscordUser>,
}

#[derive(Deserialize)]
struct DiscordErrorBody {
    code: u64,
}

/// Delivery through the Discord bot REST API
pub struct DiscordPlatform {
    client: Client,
    config: DiscordConfig,
}

impl DiscordPlatform {
    pub fn new(config: DiscordConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.config.token)
    }

    async fn fetch_channel(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<DiscordChannel, DeliveryError> {
        let response = request
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(transport)?;

        let body = check(response).await?.text().await.map_err(transport)?;
        decode_channel(&body)
    }
}

#[async_trait]
impl DeliveryPlatform for DiscordPlatform {
    async fn fetch_target(&self, kind: RecipientKind, id: &str) -> Result<Target, DeliveryError> {
        match kind {
            RecipientKind::User => {
                let request = self
                    .client
                    .post(self.url("/users/@me/channels"))
                    .json(&json!({ "recipient_id": id }));
                let dm = self.fetch_channel(request).await?;

                let display_name = dm
                    .recipients
                    .into_iter()
                    .next()
                    .map(|u| u.username)
                    .unwrap_or_else(|| id.to_string());

                Ok(Target {
                    kind,
                    id: id.to_string(),
                    channel_id: dm.id,
                    display_name,
                })
            }
            RecipientKind::Channel => {
                let request = self.client.get(self.url(&format!("/channels/{}", id)));
                let channel = self.fetch_channel(request).await?;

                Ok(Target {
                    kind,
                    id: id.to_string(),
                    display_name: channel.name.unwrap_or_default(),
                    channel_id: channel.id,
                })
            }
        }
    }

    async fn send(
        &self,
        target: &Target,
        presentation: &Presentation,
    ) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url(&format!("/channels/{}/messages", target.channel_id)))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&json!({ "embeds": [embed(presentation)] }))
            .send()
            .await
            .map_err(transport)?;

        check(response).await.map(|_| ())
    }
}

/// Discord embed for a presentation
pub fn embed(presentation: &Presentation) -> Value {
    let mut embed = json!({
        "title": presentation.title,
        "url": presentation.url,
        "color": presentation.color,
        "timestamp": presentation.timestamp.to_rfc3339(),
        "footer": {
            "text": presentation.footer.text,
            "icon_url": presentation.footer.icon_url,
        },
        "author": {
            "name": presentation.author.name,
            "url": presentation.author.url,
        },
    });

    if let Some(ref icon) = presentation.author.icon_url {
        embed["author"]["icon_url"] = json!(icon);
    }
    if let Some(ref thumbnail) = presentation.thumbnail {
        embed["thumbnail"] = json!({ "url": thumbnail });
    }

    embed
}

/// Parse a channel object from a successful response body
fn decode_channel(body: &str) -> Result<DiscordChannel, DeliveryError> {
    serde_json::from_str(body).map_err(|e| DeliveryError::Decode(e.to_string()))
}

fn transport(e: reqwest::Error) -> DeliveryError {
    DeliveryError::Transport(e.to_string())
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

/// Map a failed response onto a delivery error
fn status_error(status: StatusCode, body: &str) -> DeliveryError {
    let code = serde_json::from_str::<DiscordErrorBody>(body).ok().map(|b| b.code);

    if status == StatusCode::NOT_FOUND || matches!(code, Some(UNKNOWN_CHANNEL | UNKNOWN_USER)) {
        return DeliveryError::NotFound;
    }

    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    if status == StatusCode::FORBIDDEN {
        DeliveryError::Forbidden(body)
    } else {
        DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}
