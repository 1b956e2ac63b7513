pub mod config;
pub mod snapshot;
pub mod thresholds;
pub mod watch;

pub use config::ConfigArgs;
pub use snapshot::SnapshotArgs;
pub use thresholds::ThresholdsArgs;
pub use watch::WatchArgs;
