//! Dry-run delivery
//!
//! Resolves every recipient and logs what would have been sent.

use async_trait::async_trait;

use super::{DeliveryPlatform, Target};
use crate::error::DeliveryError;
use crate::routing::{Presentation, RecipientKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogPlatform;

impl LogPlatform {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeliveryPlatform for LogPlatform {
    async fn fetch_target(&self, kind: RecipientKind, id: &str) -> Result<Target, DeliveryError> {
        Ok(Target {
            kind,
            id: id.to_string(),
            channel_id: id.to_string(),
            display_name: format!("{}:{}", kind, id),
        })
    }

    async fn send(
        &self,
        target: &Target,
        presentation: &Presentation,
    ) -> Result<(), DeliveryError> {
        tracing::info!(
            recipient = %target,
            title = %presentation.title,
            url = %presentation.url,
            footer = %presentation.footer.text,
            "Dry run: message not sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_anything() {
        let platform = LogPlatform::new();
        let target = platform.fetch_target(RecipientKind::Channel, "123").await.unwrap();

        assert_eq!(target.channel_id, "123");
        assert_eq!(target.to_string(), "[123] channel:123");
    }
}
