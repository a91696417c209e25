//! Relay supervisor
//!
//! Owns the subscription set and wires, per subscription:
//!
//! ```text
//!   NotifyStream ──(bounded mpsc)──► dispatch task ──► Dispatcher ──► DeliverySink
//!        │
//!        └──► ContinuationStore (cursor write-through)
//! ```
//!
//! The supervisor never retries anything itself; each stream client heals
//! its own connection.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::dispatch::Dispatcher;
use crate::client::{NotifyStream, StreamConfig};
use crate::config::RelayConfig;
use crate::continuation::ContinuationStore;
use crate::delivery::{DeliveryPlatform, DeliverySink};
use crate::error::ConfigError;
use crate::routing::RoutingTable;
use crate::session::{ConnectionSnapshot, Subscription};
use crate::stats::{RelayStats, RelayStatsSnapshot};

/// Runs one stream client and one dispatch task per subscription
pub struct RelaySupervisor {
    stream_config: StreamConfig,
    subscriptions: Vec<Subscription>,
    table: RoutingTable,
    store: Arc<dyn ContinuationStore>,
    sink: Arc<DeliverySink>,
    stats: Arc<RelayStats>,
    shutdown: CancellationToken,
    states: HashMap<String, watch::Receiver<ConnectionSnapshot>>,
    tasks: Vec<JoinHandle<()>>,
}

impl RelaySupervisor {
    /// Create a supervisor with no subscriptions
    pub fn new(
        stream_config: StreamConfig,
        store: Arc<dyn ContinuationStore>,
        platform: Arc<dyn DeliveryPlatform>,
    ) -> Self {
        Self {
            stream_config,
            subscriptions: Vec::new(),
            table: RoutingTable::new(),
            store,
            sink: Arc::new(DeliverySink::new(platform)),
            stats: Arc::new(RelayStats::new()),
            shutdown: CancellationToken::new(),
            states: HashMap::new(),
            tasks: Vec::new(),
        }
    }

    /// Create a supervisor with every subscription of `config`
    pub fn from_config(
        config: &RelayConfig,
        store: Arc<dyn ContinuationStore>,
        platform: Arc<dyn DeliveryPlatform>,
    ) -> Result<Self, ConfigError> {
        let mut supervisor = Self::new(config.stream_config()?, store, platform);

        for (key, notification) in &config.notifications {
            let subscription =
                Subscription::new(key.clone(), notification.id, notification.token.clone())?;
            supervisor.add_subscription(subscription, &notification.send)?;
        }

        Ok(supervisor)
    }

    /// Add a subscription and its routing rule strings
    ///
    /// Fails on a duplicate key or any malformed rule.
    pub fn add_subscription<S: AsRef<str>>(
        &mut self,
        subscription: Subscription,
        rules: &[S],
    ) -> Result<(), ConfigError> {
        if self.subscriptions.iter().any(|s| s.key == subscription.key) {
            return Err(ConfigError::DuplicateKey(subscription.key));
        }

        self.table.add_subscription(subscription.key.clone(), rules)?;

        tracing::debug!(
            subscription = %subscription.key,
            rules = self.table.rules(&subscription.key).len(),
            "Subscription configured"
        );

        self.subscriptions.push(subscription);
        Ok(())
    }

    /// Configured subscriptions
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Token cancelled on shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Delivery counters
    pub fn stats(&self) -> RelayStatsSnapshot {
        self.stats.snapshot()
    }

    /// Latest connection state of a subscription (after [`start`](Self::start))
    pub fn connection_state(&self, key: &str) -> Option<ConnectionSnapshot> {
        self.states.get(key).map(|rx| rx.borrow().clone())
    }

    /// Watch a subscription's connection state (after [`start`](Self::start))
    pub fn watch_connection(&self, key: &str) -> Option<watch::Receiver<ConnectionSnapshot>> {
        self.states.get(key).cloned()
    }

    /// Spawn the stream client and dispatch task of every subscription
    ///
    /// Calling this more than once has no effect.
    pub fn start(&mut self) {
        if !self.tasks.is_empty() {
            return;
        }

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(self.table.clone()),
            Arc::clone(&self.sink),
            Arc::clone(&self.stats),
        ));

        for subscription in &self.subscriptions {
            let key = subscription.key.clone();

            let (stream, mut events) = NotifyStream::new(
                subscription.clone(),
                self.stream_config.clone(),
                Arc::clone(&self.store),
            );
            self.states.insert(key.clone(), stream.watch());
            self.tasks.push(stream.spawn(self.shutdown.clone()));

            let dispatcher = Arc::clone(&dispatcher);
            self.tasks.push(tokio::spawn(async move {
                // Drains whatever is queued after the stream stops
                while let Some(event) = events.recv().await {
                    dispatcher.dispatch(&key, &event).await;
                }
                tracing::debug!(subscription = %key, "Dispatch loop finished");
            }));
        }

        tracing::info!(subscriptions = self.subscriptions.len(), "Relay started");
    }

    /// Stop every connection and wait for in-flight deliveries
    pub async fn shutdown(&mut self) {
        self.shutdown.cancel();

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Relay task panicked");
            }
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            delivered = stats.delivered,
            failed = stats.failed,
            filtered = stats.filtered,
            "Relay stopped"
        );
    }

    /// Start, run until `signal` resolves, then shut down
    pub async fn run_until<F>(mut self, signal: F)
    where
        F: Future<Output = ()>,
    {
        self.start();

        tokio::select! {
            _ = signal => tracing::info!("Shutdown signal received"),
            _ = self.shutdown.cancelled() => {}
        }

        self.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::MemoryContinuationStore;
    use crate::delivery::LogPlatform;
    use crate::protocol::Endpoint;

    fn supervisor() -> RelaySupervisor {
        let config = StreamConfig::new(Endpoint::parse("http://127.0.0.1:9").unwrap());
        RelaySupervisor::new(
            config,
            Arc::new(MemoryContinuationStore::new()),
            Arc::new(LogPlatform::new()),
        )
    }

    #[test]
    fn test_add_subscription() {
        let mut supervisor = supervisor();
        let sub = Subscription::new("all", 1, "t").unwrap();

        supervisor
            .add_subscription(sub, &["channel:1:all:raw", "user:2:music:th"])
            .unwrap();

        assert_eq!(supervisor.subscriptions().len(), 1);
        assert!(supervisor.connection_state("all").is_none());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut supervisor = supervisor();
        let rules: [&str; 0] = [];

        supervisor
            .add_subscription(Subscription::new("all", 1, "t").unwrap(), &rules)
            .unwrap();
        let result = supervisor.add_subscription(Subscription::new("all", 2, "u").unwrap(), &rules);

        assert!(matches!(result, Err(ConfigError::DuplicateKey(ref k)) if k == "all"));
    }

    #[test]
    fn test_malformed_rule_rejected() {
        let mut supervisor = supervisor();
        let result = supervisor.add_subscription(
            Subscription::new("all", 1, "t").unwrap(),
            &["channel:1:all:raw", "channel:2:all"],
        );

        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
        assert!(supervisor.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_reconnecting_clients() {
        let mut supervisor = supervisor();
        supervisor
            .add_subscription(Subscription::new("all", 1, "t").unwrap(), &["channel:1:all:raw"])
            .unwrap();

        supervisor.start();
        assert!(supervisor.connection_state("all").is_some());

        // Nothing listens on port 9; the client keeps failing until shutdown
        tokio::time::timeout(std::time::Duration::from_secs(5), supervisor.shutdown())
            .await
            .expect("shutdown should not hang");
    }
}
