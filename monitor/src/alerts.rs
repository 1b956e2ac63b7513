//! Alert records and the bounded alert log

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::notifier::{DispatchReport, Notifier};
use crate::snapshot::MetricCategory;

/// Default number of alerts retained by the log
pub const DEFAULT_ALERT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub category: MetricCategory,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertRecord {
    /// Create an alert stamped with the current time
    pub fn new(category: MetricCategory, severity: Severity, message: impl Into<String>) -> Self {
        Self::at(category, severity, message, Utc::now())
    }

    pub fn at(
        category: MetricCategory,
        severity: Severity,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
            timestamp,
        }
    }
}

impl fmt::Display for AlertRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.severity,
            self.category,
            self.message
        )
    }
}

/// Bounded log of the most recent alerts.
///
/// Every successful append is followed by a dispatch to the notifier.
pub struct AlertLog {
    capacity: usize,
    entries: RwLock<VecDeque<AlertRecord>>,
    notifier: Arc<Notifier>,
}

impl AlertLog {
    pub fn new(capacity: usize, notifier: Arc<Notifier>) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(VecDeque::new()),
            notifier,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    /// Add `alert` at the tail, trim the head down to capacity, then notify
    pub async fn append(&self, alert: AlertRecord) -> DispatchReport {
        {
            let mut entries = self.entries.write().await;
            entries.push_back(alert.clone());
            while entries.len() > self.capacity {
                entries.pop_front();
            }
        }

        self.notifier.dispatch(&alert).await
    }

    /// At most `limit` most-recent alerts, oldest first
    pub async fn query(&self, limit: usize) -> Vec<AlertRecord> {
        let entries = self.entries.read().await;
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
