//! Per-event fan-out
//!
//! Every rule of the event's subscription is evaluated in order. Each
//! passing rule is rendered and delivered on its own; one recipient failing
//! never stops the others, and nothing is retried.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::Utc;

use crate::delivery::{DeliverySink, Target};
use crate::error::DeliveryError;
use crate::protocol::VideoNotification;
use crate::routing::{Presentation, RoutingRule, RoutingTable};
use crate::stats::RelayStats;

/// Width titles are cut to in log lines
const LOG_TITLE_WIDTH: usize = 30;

/// Outcome counts for one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Rules whose delivery succeeded
    pub delivered: usize,
    /// Rules whose resolve or send failed
    pub failed: usize,
    /// Rules whose filter rejected the event
    pub filtered: usize,
}

/// Routes events through the table to the delivery sink
pub struct Dispatcher {
    table: Arc<RoutingTable>,
    sink: Arc<DeliverySink>,
    stats: Arc<RelayStats>,
}

impl Dispatcher {
    pub fn new(table: Arc<RoutingTable>, sink: Arc<DeliverySink>, stats: Arc<RelayStats>) -> Self {
        Self { table, sink, stats }
    }

    /// Deliver an event of subscription `key` to every matching rule
    pub async fn dispatch(&self, key: &str, event: &VideoNotification) -> DispatchReport {
        let mut report = DispatchReport::default();
        let now = Utc::now();

        for rule in self.table.rules(key) {
            if !rule.passes(event) {
                report.filtered += 1;
                self.stats.record_filtered();
                continue;
            }

            let presentation = Presentation::render(event, rule.presentation_style, now);

            match self.deliver(rule, &presentation).await {
                Ok(target) => {
                    report.delivered += 1;
                    self.stats.record_delivered();
                    tracing::info!(
                        subscription = %key,
                        recipient = %target,
                        kind = event.event_type.short_code(),
                        channel = %ellipsize(&event.channel_title, LOG_TITLE_WIDTH),
                        video_id = %event.video_id,
                        title = %ellipsize(&event.video_title, LOG_TITLE_WIDTH),
                        "Notification delivered"
                    );
                }
                Err((target, e)) => {
                    report.failed += 1;
                    self.stats.record_failed();

                    let recipient = match target {
                        Some(target) => target.to_string(),
                        None => format!("{}:{}", rule.recipient_kind, rule.recipient_id),
                    };
                    tracing::error!(
                        subscription = %key,
                        recipient = %recipient,
                        kind = event.event_type.short_code(),
                        channel = %ellipsize(&event.channel_title, LOG_TITLE_WIDTH),
                        video_id = %event.video_id,
                        title = %ellipsize(&event.video_title, LOG_TITLE_WIDTH),
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        }

        report
    }

    /// Resolve then send; on failure, return the target if it was resolved
    async fn deliver(
        &self,
        rule: &RoutingRule,
        presentation: &Presentation,
    ) -> Result<Target, (Option<Target>, DeliveryError)> {
        let target = self
            .sink
            .resolve(rule.recipient_kind, &rule.recipient_id)
            .await
            .map_err(|e| (None, e))?;

        match self.sink.deliver(&target, presentation).await {
            Ok(()) => Ok(target),
            Err(e) => Err((Some(target), e)),
        }
    }
}

/// Cut `text` to `width` characters plus an ellipsis when it is longer
/// than `width + 1`
fn ellipsize(text: &str, width: usize) -> Cow<'_, str> {
    if text.chars().count() <= width + 1 {
        return Cow::Borrowed(text);
    }

    let mut cut: String = text.chars().take(width).collect();
    cut.push('…');
    Cow::Owned(cut)
}
