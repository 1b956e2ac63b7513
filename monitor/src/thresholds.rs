//! Threshold table and alert rule evaluation

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::alerts::{AlertRecord, Severity};
use crate::error::{MonitorError, Result};
use crate::snapshot::{MetricCategory, Snapshot};

/// Tick rate below which the application is considered lagging.
/// Not part of the mutable threshold table.
pub const MIN_TICK_RATE: f64 = 15.0;

/// Percentage limits per thresholded category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu: 80.0,
            memory: 85.0,
            disk: 90.0,
        }
    }
}

impl Thresholds {
    pub fn get(&self, category: MetricCategory) -> Option<f64> {
        match category {
            MetricCategory::Cpu => Some(self.cpu),
            MetricCategory::Memory => Some(self.memory),
            MetricCategory::Disk => Some(self.disk),
            _ => None,
        }
    }

    /// Set one limit; only cpu, memory and disk accept a finite value
    pub fn set(&mut self, category: MetricCategory, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MonitorError::InvalidThreshold { category, value });
        }
        match category {
            MetricCategory::Cpu => self.cpu = value,
            MetricCategory::Memory => self.memory = value,
            MetricCategory::Disk => self.disk = value,
            _ => return Err(MonitorError::InvalidThreshold { category, value }),
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricCategory, f64)> + '_ {
        [
            (MetricCategory::Cpu, self.cpu),
            (MetricCategory::Memory, self.memory),
            (MetricCategory::Disk, self.disk),
        ]
        .into_iter()
    }
}

/// Shared, lock-guarded threshold table.
///
/// Evaluation works on a copy taken under the read lock, so an update is
/// either fully visible to an evaluation or not at all.
pub struct ThresholdTable {
    inner: RwLock<Thresholds>,
}

impl ThresholdTable {
    pub fn new(initial: Thresholds) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    pub async fn current(&self) -> Thresholds {
        *self.inner.read().await
    }

    pub async fn set(&self, category: MetricCategory, value: f64) -> Result<()> {
        let mut table = self.inner.write().await;
        table.set(category, value)?;
        tracing::info!(%category, value, "Alert threshold updated");
        Ok(())
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

/// Map a snapshot to its alerts.
///
/// Rules are checked independently and strictly (a value equal to its limit
/// does not alert). Output order is always cpu, memory, disk, application.
pub fn evaluate(snapshot: &Snapshot, thresholds: &Thresholds) -> Vec<AlertRecord> {
    let mut alerts = Vec::new();
    let at = snapshot.timestamp;

    if snapshot.cpu.percent > thresholds.cpu {
        alerts.push(AlertRecord::at(
            MetricCategory::Cpu,
            Severity::Warning,
            format!("High CPU load: {:.1}%", snapshot.cpu.percent),
            at,
        ));
    }

    if snapshot.memory.percent > thresholds.memory {
        alerts.push(AlertRecord::at(
            MetricCategory::Memory,
            Severity::Warning,
            format!("High memory usage: {:.1}%", snapshot.memory.percent),
            at,
        ));
    }

    if snapshot.disk.percent > thresholds.disk {
        alerts.push(AlertRecord::at(
            MetricCategory::Disk,
            Severity::Critical,
            format!("Low disk space: {:.1}% used", snapshot.disk.percent),
            at,
        ));
    }

    if snapshot.application.tick_rate < MIN_TICK_RATE {
        alerts.push(AlertRecord::at(
            MetricCategory::Application,
            Severity::Warning,
            format!("Low server TPS: {:.1}", snapshot.application.tick_rate),
            at,
        ));
    }

    alerts
}
