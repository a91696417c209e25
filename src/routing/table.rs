//! Per-subscription routing table
//!
//! Built once from configuration and shared read-only between dispatch
//! tasks.

use std::collections::HashMap;

use super::rule::RoutingRule;
use crate::error::ConfigError;
use crate::protocol::VideoNotification;

/// Routing rules keyed by subscription
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    rules: HashMap<String, Vec<RoutingRule>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and add the rule strings of one subscription
    ///
    /// Any malformed rule fails the whole subscription.
    pub fn add_subscription<S: AsRef<str>>(
        &mut self,
        key: impl Into<String>,
        rules: &[S],
    ) -> Result<(), ConfigError> {
        let parsed = rules
            .iter()
            .map(|r| r.as_ref().parse())
            .collect::<Result<Vec<RoutingRule>, _>>()?;

        self.rules.insert(key.into(), parsed);
        Ok(())
    }

    /// All rules of a subscription, in configuration order
    pub fn rules(&self, key: &str) -> &[RoutingRule] {
        self.rules.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rules of a subscription whose filter passes the event
    pub fn matching<'a>(
        &'a self,
        key: &str,
        event: &'a VideoNotification,
    ) -> impl Iterator<Item = &'a RoutingRule> + 'a {
        self.rules(key).iter().filter(move |rule| rule.passes(event))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
