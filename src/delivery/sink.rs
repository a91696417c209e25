//! Caching delivery sink
//!
//! Resolved recipients are cached by `(kind, id)`. The cache is shared by
//! every subscription's dispatch task; a fill race simply keeps the last
//! write, since every entry for a key is equivalent.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{DeliveryPlatform, Target};
use crate::error::DeliveryError;
use crate::routing::{Presentation, RecipientKind};

type CacheKey = (RecipientKind, String);

/// Resolves recipients through a cache and sends through a platform
pub struct DeliverySink {
    platform: Arc<dyn DeliveryPlatform>,
    cache: RwLock<HashMap<CacheKey, Target>>,
}

impl DeliverySink {
    pub fn new(platform: Arc<dyn DeliveryPlatform>) -> Self {
        Self {
            platform,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a recipient, fetching and caching it on a miss
    pub async fn resolve(&self, kind: RecipientKind, id: &str) -> Result<Target, DeliveryError> {
        let key = (kind, id.to_string());

        let cached = self.cache.read().get(&key).cloned();
        if let Some(target) = cached {
            return Ok(target);
        }

        let target = self.platform.fetch_target(kind, id).await?;
        self.cache.write().insert(key, target.clone());

        tracing::debug!(kind = %kind, id = %id, recipient = %target, "Recipient cached");

        Ok(target)
    }

    /// Send to a resolved recipient
    ///
    /// A `NotFound` answer drops the cached entry so the next delivery
    /// fetches it again.
    pub async fn deliver(
        &self,
        target: &Target,
        presentation: &Presentation,
    ) -> Result<(), DeliveryError> {
        let result = self.platform.send(target, presentation).await;

        if let Err(ref e) = result {
            if e.invalidates_cache() {
                self.invalidate(target.kind, &target.id);
            }
        }

        result
    }

    /// Drop a cached recipient
    pub fn invalidate(&self, kind: RecipientKind, id: &str) {
        if self.cache.write().remove(&(kind, id.to_string())).is_some() {
            tracing::debug!(kind = %kind, id = %id, "Recipient evicted from cache");
        }
    }

    /// Whether a recipient is cached
    pub fn is_cached(&self, kind: RecipientKind, id: &str) -> bool {
        self.cache.read().contains_key(&(kind, id.to_string()))
    }

    /// Number of cached recipients
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;

    use super::*;
    use crate::routing::{Author, Footer};

    #[derive(Default)]
    struct FakePlatform {
        fetches: AtomicUsize,
        sends: AtomicUsize,
        /// Ids that no longer exist when sending
        gone: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DeliveryPlatform for FakePlatform {
        async fn fetch_target(
            &self,
            kind: RecipientKind,
            id: &str,
        ) -> Result<Target, DeliveryError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if id == "missing" {
                return Err(DeliveryError::NotFound);
            }
            Ok(Target {
                kind,
                id: id.to_string(),
                channel_id: format!("dm-{}", id),
                display_name: format!("name-{}", id),
            })
        }

        async fn send(&self, target: &Target, _: &Presentation) -> Result<(), DeliveryError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if self.gone.lock().contains(&target.id) {
                return Err(DeliveryError::NotFound);
            }
            if target.id == "locked" {
                return Err(DeliveryError::Forbidden("Missing Access".into()));
            }
            Ok(())
        }
    }

    fn presentation() -> Presentation {
        Presentation {
            title: "t".into(),
            url: "https://youtu.be/x".into(),
            color: 0,
            timestamp: Utc::now(),
            author: Author {
                name: "a".into(),
                url: "u".into(),
                icon_url: None,
            },
            footer: Footer {
                text: "uploaded".into(),
                icon_url: "i".into(),
            },
            thumbnail: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_caches() {
        let platform = Arc::new(FakePlatform::default());
        let sink = DeliverySink::new(platform.clone());

        let first = sink.resolve(RecipientKind::User, "42").await.unwrap();
        let second = sink.resolve(RecipientKind::User, "42").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.channel_id, "dm-42");
        assert_eq!(platform.fetches.load(Ordering::SeqCst), 1);
        assert!(sink.is_cached(RecipientKind::User, "42"));
    }

    #[tokio::test]
    async fn test_kind_is_part_of_the_key() {
        let platform = Arc::new(FakePlatform::default());
        let sink = DeliverySink::new(platform.clone());

        sink.resolve(RecipientKind::User, "1").await.unwrap();
        sink.resolve(RecipientKind::Channel, "1").await.unwrap();

        assert_eq!(sink.cached_count(), 2);
        assert_eq!(platform.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolve_failure_is_not_cached() {
        let platform = Arc::new(FakePlatform::default());
        let sink = DeliverySink::new(platform.clone());

        assert!(sink.resolve(RecipientKind::Channel, "missing").await.is_err());
        assert!(sink.resolve(RecipientKind::Channel, "missing").await.is_err());

        assert_eq!(sink.cached_count(), 0);
        assert_eq!(platform.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_on_send_invalidates() {
        let platform = Arc::new(FakePlatform::default());
        let sink = DeliverySink::new(platform.clone());

        let target = sink.resolve(RecipientKind::Channel, "7").await.unwrap();
        platform.gone.lock().push("7".into());

        let result = sink.deliver(&target, &presentation()).await;
        assert!(matches!(result, Err(DeliveryError::NotFound)));
        assert!(!sink.is_cached(RecipientKind::Channel, "7"));
    }

    #[tokio::test]
    async fn test_forbidden_keeps_cache() {
        let platform = Arc::new(FakePlatform::default());
        let sink = DeliverySink::new(platform.clone());

        let target = sink.resolve(RecipientKind::Channel, "locked").await.unwrap();
        let result = sink.deliver(&target, &presentation()).await;

        assert!(matches!(result, Err(DeliveryError::Forbidden(_))));
        assert!(sink.is_cached(RecipientKind::Channel, "locked"));
    }

    #[tokio::test]
    async fn test_no_dedup() {
        let platform = Arc::new(FakePlatform::default());
        let sink = DeliverySink::new(platform.clone());

        let target = sink.resolve(RecipientKind::Channel, "1").await.unwrap();
        let p = presentation();

        tokio_test::assert_ok!(sink.deliver(&target, &p).await);
        tokio_test::assert_ok!(sink.deliver(&target, &p).await);
        assert_eq!(platform.sends.load(Ordering::SeqCst), 2);
    }
}
