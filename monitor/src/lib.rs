//! SparkPanel resource monitor library
//!
//! This library samples host and game-server metrics on a background task,
//! keeps a bounded per-category history, evaluates alert thresholds and
//! fans new alerts out to subscribers.

pub mod alerts;
pub mod collector;
pub mod config;
pub mod error;
pub mod history;
pub mod metrics;
pub mod monitor;
pub mod notifier;
pub mod probe;
pub mod rcon;
pub mod snapshot;
pub mod thresholds;

// Re-export commonly used types
pub use alerts::{AlertLog, AlertRecord, Severity};
pub use collector::{MetricsSource, SystemCollector};
pub use config::{MonitorConfig, ProbeKind};
pub use error::{MonitorError, Result};
pub use history::{HistoryEntry, HistoryStore};
pub use metrics::MonitorMetrics;
pub use monitor::ResourceMonitor;
pub use notifier::{AlertSubscriber, DispatchReport, Notifier, SubscriptionId};
pub use probe::{ApplicationProbe, SimulatedGameServer};
pub use rcon::RconProbe;
pub use snapshot::{CategoryRecord, MetricCategory, Snapshot};
pub use thresholds::{ThresholdTable, Thresholds};
