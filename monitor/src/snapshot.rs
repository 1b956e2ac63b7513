//! Snapshot data model
//!
//! A [`Snapshot`] is one timestamped set of readings across every metric
//! category. Snapshots are immutable once produced; the history store keeps
//! per-category copies of the individual records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nominal tick rate of a healthy game server
pub const NOMINAL_TICK_RATE: f64 = 20.0;

/// A named group of related metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    Cpu,
    Memory,
    Disk,
    Network,
    Application,
}

impl MetricCategory {
    /// All categories in enumeration order
    pub const ALL: [MetricCategory; 5] = [
        MetricCategory::Cpu,
        MetricCategory::Memory,
        MetricCategory::Disk,
        MetricCategory::Network,
        MetricCategory::Application,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Cpu => "cpu",
            MetricCategory::Memory => "memory",
            MetricCategory::Disk => "disk",
            MetricCategory::Network => "network",
            MetricCategory::Application => "application",
        }
    }

    /// Whether the mutable threshold table has an entry for this category
    pub fn has_threshold(&self) -> bool {
        matches!(
            self,
            MetricCategory::Cpu | MetricCategory::Memory | MetricCategory::Disk
        )
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(MetricCategory::Cpu),
            "memory" | "mem" => Ok(MetricCategory::Memory),
            "disk" => Ok(MetricCategory::Disk),
            "network" | "net" => Ok(MetricCategory::Network),
            "application" | "app" | "minecraft" => Ok(MetricCategory::Application),
            _ => Err(format!("Unknown metric category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuReading {
    pub percent: f64,
    pub cores: usize,
    pub frequency_mhz: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskReading {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub percent: f64,
}

impl DiskReading {
    /// Build a reading from capacity figures; an empty disk reports 0%
    pub fn from_space(total_bytes: u64, free_bytes: u64) -> Self {
        let used_bytes = total_bytes.saturating_sub(free_bytes);
        let percent = if total_bytes > 0 {
            used_bytes as f64 / total_bytes as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total_bytes,
            used_bytes,
            free_bytes,
            percent,
        }
    }
}

/// Cumulative interface counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkReading {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

/// Status of the monitored application (a game server)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationReading {
    pub online: bool,
    pub players_online: u32,
    pub players_max: u32,
    /// Server ticks per second
    pub tick_rate: f64,
    pub uptime_secs: u64,
    pub chunks_loaded: u64,
    pub entities: u64,
}

impl ApplicationReading {
    /// Stand-in used when the application cannot be reached.
    ///
    /// Reports the nominal tick rate so an unreachable server never raises a
    /// tick-rate alert on its own.
    pub fn placeholder() -> Self {
        Self {
            online: false,
            players_online: 0,
            players_max: 0,
            tick_rate: NOMINAL_TICK_RATE,
            uptime_secs: 0,
            chunks_loaded: 0,
            entities: 0,
        }
    }
}

/// The record stored for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum CategoryRecord {
    Cpu(CpuReading),
    Memory(MemoryReading),
    Disk(DiskReading),
    Network(NetworkReading),
    Application(ApplicationReading),
}

impl CategoryRecord {
    pub fn category(&self) -> MetricCategory {
        match self {
            CategoryRecord::Cpu(_) => MetricCategory::Cpu,
            CategoryRecord::Memory(_) => MetricCategory::Memory,
            CategoryRecord::Disk(_) => MetricCategory::Disk,
            CategoryRecord::Network(_) => MetricCategory::Network,
            CategoryRecord::Application(_) => MetricCategory::Application,
        }
    }
}

/// One timestamped set of readings across all categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuReading,
    pub memory: MemoryReading,
    pub disk: DiskReading,
    pub network: NetworkReading,
    pub application: ApplicationReading,
}

impl Snapshot {
    /// Extract the record for a single category
    pub fn record(&self, category: MetricCategory) -> CategoryRecord {
        match category {
            MetricCategory::Cpu => CategoryRecord::Cpu(self.cpu.clone()),
            MetricCategory::Memory => CategoryRecord::Memory(self.memory.clone()),
            MetricCategory::Disk => CategoryRecord::Disk(self.disk.clone()),
            MetricCategory::Network => CategoryRecord::Network(self.network.clone()),
            MetricCategory::Application => {
                CategoryRecord::Application(self.application.clone())
            }
        }
    }

    /// All records in category enumeration order
    pub fn records(&self) -> impl Iterator<Item = CategoryRecord> + '_ {
        MetricCategory::ALL.iter().map(move |c| self.record(*c))
    }
}
