use std::sync::Arc;
use std::time::Duration;

use arcade_shared::{Notification, Query, Selection};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{SUBSCRIPTION_RETRY_BASE_MS, SUBSCRIPTION_RETRY_MAX_MS};
use crate::error::Result;
use crate::fetch::discriminate_all;
use crate::state::FeedCounters;
use crate::transport::{IndexerTransport, NotificationStream};

/// Live subscription owned by the caller. Closing or dropping it stops delivery.
#[derive(Debug)]
pub struct SubscriptionHandle {
    topic: &'static str,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn topic(&self) -> &'static str {
        self.topic
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }

    pub fn close(self) {
        debug!(topic = self.topic, "closing entity subscription");
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn resubscribe_backoff(consecutive_failures: u32) -> Duration {
    let exponent = consecutive_failures.saturating_sub(1).min(6);
    Duration::from_millis((SUBSCRIPTION_RETRY_BASE_MS << exponent).min(SUBSCRIPTION_RETRY_MAX_MS))
}

/// Models to deliver for one push, or `None` when there is nothing to report.
fn deliverable<S: Selection>(
    notification: Notification,
    namespace: &str,
    counters: &FeedCounters,
) -> Option<Vec<S::Model>> {
    counters.record_notification();
    if let Some(error) = notification.error.as_deref() {
        counters.record_subscription_error();
        warn!(topic = S::TOPIC, error, "indexer reported a subscription error");
        return None;
    }
    let changes = notification.into_changes();
    if changes.is_empty() {
        return None;
    }
    let models = discriminate_all::<S>(&changes, namespace, counters);
    (!models.is_empty()).then_some(models)
}

/// Register `query` again until the service accepts it.
async fn reregister<S: Selection, T: IndexerTransport>(
    transport: &T,
    query: &Query,
    counters: &FeedCounters,
) -> NotificationStream {
    let mut attempt = 0u32;
    loop {
        attempt = attempt.saturating_add(1);
        let backoff = resubscribe_backoff(attempt);
        tokio::time::sleep(backoff).await;
        counters.record_resubscription();
        match transport.subscribe_entities(query).await {
            Ok(stream) => {
                info!(topic = S::TOPIC, attempt, "entity subscription registered again");
                return stream;
            }
            Err(e) => {
                counters.record_subscription_error();
                warn!(
                    topic = S::TOPIC,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "entity subscription re-registration failed"
                );
            }
        }
    }
}

/// Register a subscription and spawn the task that feeds `callback`. Returns once the service
/// has accepted the registration. When the push stream ends the task registers the query
/// again, backing off between failed attempts, until the handle is closed.
pub async fn subscribe<S, T, F>(
    transport: Arc<T>,
    query: Query,
    namespace: String,
    counters: Arc<FeedCounters>,
    mut callback: F,
) -> Result<SubscriptionHandle>
where
    S: Selection,
    T: IndexerTransport,
    F: FnMut(Vec<S::Model>) + Send + 'static,
{
    let mut stream = transport.subscribe_entities(&query).await?;
    let task: JoinHandle<()> = tokio::spawn(async move {
        loop {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(notification) => {
                        if let Some(models) = deliverable::<S>(notification, &namespace, &counters)
                        {
                            callback(models);
                        }
                    }
                    Err(e) => {
                        counters.record_subscription_error();
                        warn!(topic = S::TOPIC, error = %e, "subscription stream error");
                    }
                }
            }
            warn!(topic = S::TOPIC, "entity subscription stream ended");
            stream = reregister::<S, T>(&transport, &query, &counters).await;
        }
    });
    debug!(topic = S::TOPIC, "entity subscription registered");
    Ok(SubscriptionHandle {
        topic: S::TOPIC,
        task,
    })
}
