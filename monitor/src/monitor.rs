//! Resource monitor and its background sampler
//!
//! One long-lived worker task drives collect, record, evaluate and alert at
//! a fixed interval. Consumers read results through the shared history and
//! alert log, or receive alerts via subscribers.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::alerts::{AlertLog, AlertRecord, Severity};
use crate::collector::{MetricsSource, SystemCollector};
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::history::{HistoryEntry, HistoryStore};
use crate::metrics::MonitorMetrics;
use crate::notifier::{AlertSubscriber, Notifier, SubscriptionId};
use crate::snapshot::{CategoryRecord, MetricCategory};
use crate::thresholds::{evaluate, ThresholdTable, Thresholds};

/// Default number of history entries returned per query
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Default number of alerts returned per query
pub const DEFAULT_ALERT_LIMIT: usize = 50;

/// State shared between the facade and the worker task
struct Shared {
    source: Arc<dyn MetricsSource>,
    history: HistoryStore,
    alerts: AlertLog,
    thresholds: ThresholdTable,
    metrics: MonitorMetrics,
}

impl Shared {
    async fn sample(&self) -> Vec<AlertRecord> {
        let snapshot = self.source.collect().await;
        self.history.record(&snapshot).await;
        self.metrics.record_snapshot(&snapshot);

        let thresholds = self.thresholds.current().await;
        let raised = evaluate(&snapshot, &thresholds);
        for alert in &raised {
            self.append(alert.clone()).await;
        }
        raised
    }

    async fn append(&self, alert: AlertRecord) {
        let severity = alert.severity;
        warn!(category = %alert.category, %severity, message = %alert.message, "Alert raised");
        let report = self.alerts.append(alert).await;
        self.metrics.record_alert(severity, &report);
    }
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct ResourceMonitor {
    shared: Arc<Shared>,
    default_interval: Duration,
    worker: Mutex<Option<Worker>>,
    is_running: AtomicBool,
}

impl ResourceMonitor {
    /// Wire a monitor around `source` using the capacities and thresholds
    /// from `config`
    pub fn new(config: &MonitorConfig, source: Arc<dyn MetricsSource>) -> Result<Self> {
        let notifier = Arc::new(Notifier::new());
        let shared = Shared {
            source,
            history: HistoryStore::new(config.sampling.history_capacity),
            alerts: AlertLog::new(config.sampling.alert_capacity, notifier),
            thresholds: ThresholdTable::new(config.thresholds),
            metrics: MonitorMetrics::new()?,
        };

        Ok(Self {
            shared: Arc::new(shared),
            default_interval: config.sampling.interval(),
            worker: Mutex::new(None),
            is_running: AtomicBool::new(false),
        })
    }

    /// Monitor backed by the host collector described in `config`
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        Self::new(config, Arc::new(SystemCollector::from_config(config)))
    }

    pub fn with_source<S>(config: &MonitorConfig, source: S) -> Result<Self>
    where
        S: MetricsSource + 'static,
    {
        Self::new(config, Arc::new(source))
    }

    /// Spawn the sampler. Returns false (and does nothing) if it is
    /// already running.
    pub async fn start(&self, interval: Duration) -> bool {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            debug!("Sampler already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_sampler(
            Arc::clone(&self.shared),
            interval,
            cancel.clone(),
        ));
        *worker = Some(Worker { cancel, handle });
        self.is_running.store(true, Ordering::SeqCst);

        info!(interval_ms = interval.as_millis() as u64, "Resource monitor started");
        true
    }

    /// Start with the configured interval
    pub async fn start_default(&self) -> bool {
        self.start(self.default_interval).await
    }

    /// Stop the sampler and wait for the worker to exit.
    ///
    /// An in-progress iteration is allowed to finish; nothing is recorded
    /// after this returns. Stopping a stopped monitor is a no-op.
    pub async fn stop(&self) {
        let mut worker = self.worker.lock().await;
        let Some(Worker { cancel, handle }) = worker.take() else {
            return;
        };

        cancel.cancel();
        if let Err(e) = handle.await {
            error!(error = %e, "Sampler worker terminated abnormally");
        }
        self.is_running.store(false, Ordering::SeqCst);
        info!("Resource monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    /// Run one pipeline iteration inline and return the alerts it raised
    pub async fn sample_once(&self) -> Vec<AlertRecord> {
        self.shared.sample().await
    }

    /// Up to `limit` most-recent entries for `category`, oldest first
    pub async fn metrics_history(
        &self,
        category: MetricCategory,
        limit: Option<usize>,
    ) -> Vec<HistoryEntry> {
        self.shared
            .history
            .query(category, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .await
    }

    /// Latest record per category
    pub async fn current_metrics(&self) -> BTreeMap<MetricCategory, CategoryRecord> {
        self.shared.history.latest().await
    }

    pub async fn alerts(&self, limit: Option<usize>) -> Vec<AlertRecord> {
        self.shared
            .alerts
            .query(limit.unwrap_or(DEFAULT_ALERT_LIMIT))
            .await
    }

    pub async fn clear_alerts(&self) {
        self.shared.alerts.clear().await;
        info!("Alert log cleared");
    }

    /// Append an externally raised alert; subscribers are notified as usual
    pub async fn add_alert(
        &self,
        category: MetricCategory,
        severity: Severity,
        message: impl Into<String>,
    ) {
        self.shared
            .append(AlertRecord::new(category, severity, message))
            .await;
    }

    pub async fn subscribe<S>(&self, subscriber: S) -> SubscriptionId
    where
        S: AlertSubscriber + 'static,
    {
        self.shared.alerts.notifier().subscribe(subscriber).await
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.alerts.notifier().unsubscribe(id).await
    }

    /// Update one threshold; applies from the next evaluation
    pub async fn set_threshold(&self, category: MetricCategory, value: f64) -> Result<()> {
        self.shared.thresholds.set(category, value).await
    }

    pub async fn thresholds(&self) -> Thresholds {
        self.shared.thresholds.current().await
    }

    pub fn metrics(&self) -> &MonitorMetrics {
        &self.shared.metrics
    }
}

impl Drop for ResourceMonitor {
    fn drop(&mut self) {
        // Without an async context the best we can do is signal the worker.
        if let Some(worker) = self.worker.get_mut().take() {
            worker.cancel.cancel();
        }
    }
}

async fn run_sampler(shared: Arc<Shared>, interval: Duration, cancel: CancellationToken) {
    debug!("Sampler worker running");

    while !cancel.is_cancelled() {
        let iteration = AssertUnwindSafe(shared.sample()).catch_unwind().await;
        if let Err(panic) = iteration {
            shared.metrics.record_iteration_failure();
            error!(reason = %panic_reason(panic.as_ref()), "Sampling iteration failed");
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!("Sampler worker exited");
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
