//! Snapshot collection
//!
//! [`MetricsSource`] is the seam between the sampler and the host. The
//! production source is [`SystemCollector`] (sysinfo plus an optional
//! application probe); tests plug in closures.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sysinfo::{Disks, Networks, System};
use tokio::sync::Mutex;

use crate::config::{MonitorConfig, ProbeKind};
use crate::probe::{ApplicationProbe, SimulatedGameServer};
use crate::rcon::RconProbe;
use crate::snapshot::{
    ApplicationReading, CpuReading, DiskReading, MemoryReading, NetworkReading, Snapshot,
};

/// Produces one snapshot per call.
///
/// Implementations should not fail: unreadable metrics degrade to zeroed
/// or placeholder readings. A panic is tolerated by the sampler but costs
/// the iteration.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn collect(&self) -> Snapshot;
}

#[async_trait]
impl<F> MetricsSource for F
where
    F: Fn() -> Snapshot + Send + Sync,
{
    async fn collect(&self) -> Snapshot {
        self()
    }
}

/// Host metrics via sysinfo
pub struct SystemCollector {
    system: Mutex<System>,
    disk_mount_point: PathBuf,
    probe: Option<Arc<dyn ApplicationProbe>>,
}

impl SystemCollector {
    pub fn new(disk_mount_point: impl Into<PathBuf>) -> Self {
        Self {
            system: Mutex::new(System::new()),
            disk_mount_point: disk_mount_point.into(),
            probe: None,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ApplicationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Build a collector and its application probe from configuration
    pub fn from_config(config: &MonitorConfig) -> Self {
        let collector = Self::new(config.collector.disk_mount_point.clone());
        let app = &config.application;

        match app.probe {
            ProbeKind::Simulated => collector.with_probe(Arc::new(SimulatedGameServer::connected(
                format!("{}:{}", app.rcon_host, app.rcon_port),
            ))),
            ProbeKind::Rcon => collector.with_probe(Arc::new(RconProbe::new(
                &app.rcon_host,
                app.rcon_port,
                app.rcon_password.clone(),
                app.timeout(),
            ))),
            ProbeKind::Disabled => collector,
        }
    }

    pub fn has_probe(&self) -> bool {
        self.probe.is_some()
    }

    async fn host_readings(&self) -> (CpuReading, MemoryReading) {
        let mut system = self.system.lock().await;

        // CPU usage is a delta between two refreshes
        system.refresh_cpu();
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        system.refresh_cpu();
        system.refresh_memory();

        let cpu = CpuReading {
            percent: system.global_cpu_info().cpu_usage() as f64,
            cores: system.cpus().len(),
            frequency_mhz: system.cpus().first().map(|c| c.frequency()).unwrap_or(0),
        };

        let total = system.total_memory();
        let available = system.available_memory();
        let memory = MemoryReading {
            total_bytes: total,
            available_bytes: available,
            used_bytes: system.used_memory(),
            percent: if total > 0 {
                total.saturating_sub(available) as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        };

        (cpu, memory)
    }

    fn disk_reading(&self) -> DiskReading {
        let disks = Disks::new_with_refreshed_list();
        let spaces: Vec<(&Path, u64, u64)> = disks
            .list()
            .iter()
            .map(|d| (d.mount_point(), d.total_space(), d.available_space()))
            .collect();

        match select_disk(&spaces, &self.disk_mount_point) {
            Some((total, free)) => DiskReading::from_space(total, free),
            None => {
                tracing::debug!(mount = %self.disk_mount_point.display(), "No disk found");
                DiskReading::from_space(0, 0)
            }
        }
    }

    fn network_reading(&self) -> NetworkReading {
        let networks = Networks::new_with_refreshed_list();
        networks
            .iter()
            .fold(NetworkReading::default(), |mut acc, (_, data)| {
                acc.bytes_sent += data.total_transmitted();
                acc.bytes_recv += data.total_received();
                acc.packets_sent += data.total_packets_transmitted();
                acc.packets_recv += data.total_packets_received();
                acc
            })
    }

    async fn application_reading(&self) -> ApplicationReading {
        let Some(probe) = &self.probe else {
            return ApplicationReading::placeholder();
        };

        match probe.status().await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!(probe = probe.name(), error = %e, "Application probe failed");
                ApplicationReading::placeholder()
            }
        }
    }
}

/// Pick the disk mounted at the longest prefix of `target`, falling back to
/// the largest disk. Returns (total, free).
fn select_disk(disks: &[(&Path, u64, u64)], target: &Path) -> Option<(u64, u64)> {
    disks
        .iter()
        .filter(|(mount, _, _)| target.starts_with(mount))
        .max_by_key(|(mount, _, _)| mount.as_os_str().len())
        .or_else(|| disks.iter().max_by_key(|(_, total, _)| *total))
        .map(|(_, total, free)| (*total, *free))
}

#[async_trait]
impl MetricsSource for SystemCollector {
    async fn collect(&self) -> Snapshot {
        let (cpu, memory) = self.host_readings().await;
        let disk = self.disk_reading();
        let network = self.network_reading();
        let application = self.application_reading().await;

        Snapshot {
            timestamp: Utc::now(),
            cpu,
            memory,
            disk,
            network,
            application,
        }
    }
}
