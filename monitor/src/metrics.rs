//! Prometheus counters for the sampler
//!
//! Each monitor owns a private registry so several monitors (and tests) can
//! coexist in one process.

use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::alerts::Severity;
use crate::error::{MetricsError, MetricsResult};
use crate::notifier::DispatchReport;
use crate::snapshot::Snapshot;

#[derive(Clone)]
pub struct MonitorMetrics {
    registry: Registry,

    pub samples: IntCounter,
    pub iteration_failures: IntCounter,
    pub alerts: IntCounterVec,
    pub subscriber_failures: IntCounter,

    pub cpu_percent: Gauge,
    pub memory_percent: Gauge,
    pub disk_percent: Gauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> MetricsResult<IntCounter> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> MetricsResult<Gauge> {
    let gauge = Gauge::new(name, help)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

impl MonitorMetrics {
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();

        let samples = counter(
            &registry,
            "sparkpanel_samples_total",
            "Snapshots recorded into history",
        )?;
        let iteration_failures = counter(
            &registry,
            "sparkpanel_iteration_failures_total",
            "Sampler iterations that failed or panicked",
        )?;
        let alerts = IntCounterVec::new(
            Opts::new("sparkpanel_alerts_total", "Alerts appended to the alert log"),
            &["severity"],
        )?;
        registry.register(Box::new(alerts.clone()))?;
        let subscriber_failures = counter(
            &registry,
            "sparkpanel_subscriber_failures_total",
            "Alert deliveries that failed or panicked",
        )?;

        let cpu_percent = gauge(&registry, "sparkpanel_cpu_percent", "Last sampled CPU usage")?;
        let memory_percent = gauge(
            &registry,
            "sparkpanel_memory_percent",
            "Last sampled memory usage",
        )?;
        let disk_percent = gauge(&registry, "sparkpanel_disk_percent", "Last sampled disk usage")?;

        Ok(Self {
            registry,
            samples,
            iteration_failures,
            alerts,
            subscriber_failures,
            cpu_percent,
            memory_percent,
            disk_percent,
        })
    }

    pub fn record_snapshot(&self, snapshot: &Snapshot) {
        self.samples.inc();
        self.cpu_percent.set(snapshot.cpu.percent);
        self.memory_percent.set(snapshot.memory.percent);
        self.disk_percent.set(snapshot.disk.percent);
    }

    pub fn record_alert(&self, severity: Severity, report: &DispatchReport) {
        self.alerts.with_label_values(&[severity.as_str()]).inc();
        self.subscriber_failures.inc_by(report.failed as u64);
    }

    pub fn record_iteration_failure(&self) {
        self.iteration_failures.inc();
    }

    pub fn alert_count(&self, severity: Severity) -> u64 {
        self.alerts.with_label_values(&[severity.as_str()]).get()
    }

    /// Render the registry in the Prometheus text exposition format
    pub fn export(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder
            .encode(&families, &mut buf)
            .map_err(|e| MetricsError::ExportFailed {
                reason: e.to_string(),
            })?;
        String::from_utf8(buf).map_err(|e| MetricsError::ExportFailed {
            reason: e.to_string(),
        })
    }
}
