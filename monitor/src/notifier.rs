//! Alert fan-out to registered subscribers
//!
//! Subscribers are invoked synchronously, in registration order, each time
//! an alert is appended to the log. A subscriber that returns an error or
//! panics is logged and skipped; the remaining subscribers still run.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::alerts::AlertRecord;

/// Receiver of newly appended alerts
pub trait AlertSubscriber: Send + Sync {
    fn on_alert(&self, alert: &AlertRecord) -> anyhow::Result<()>;
}

impl<F> AlertSubscriber for F
where
    F: Fn(&AlertRecord) -> anyhow::Result<()> + Send + Sync,
{
    fn on_alert(&self, alert: &AlertRecord) -> anyhow::Result<()> {
        self(alert)
    }
}

/// Handle returned by [`Notifier::subscribe`]; ids are never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Outcome of one dispatch round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct Notifier {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriptionId, Arc<dyn AlertSubscriber>)>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub async fn subscribe<S>(&self, subscriber: S) -> SubscriptionId
    where
        S: AlertSubscriber + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().await.push((id, Arc::new(subscriber)));
        tracing::debug!(subscription = id.0, "Alert subscriber registered");
        id
    }

    /// Remove a subscriber; returns false if the id was not registered
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        let removed = subscribers.len() != before;
        if removed {
            tracing::debug!(subscription = id.0, "Alert subscriber removed");
        }
        removed
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Deliver `alert` to every subscriber in registration order
    pub async fn dispatch(&self, alert: &AlertRecord) -> DispatchReport {
        // Callbacks run outside the lock so they may be slow without
        // blocking (un)registration.
        let subscribers: Vec<_> = self.subscribers.read().await.clone();
        let mut report = DispatchReport::default();

        for (id, subscriber) in subscribers {
            match panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_alert(alert))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::warn!(subscription = id.0, "Alert subscriber failed: {:#}", e);
                }
                Err(payload) => {
                    report.failed += 1;
                    tracing::warn!(
                        subscription = id.0,
                        "Alert subscriber panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        report
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
