//! Configuration management for the SparkPanel monitor
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `SPARKPANEL__`-prefixed environment variables
//! (e.g. `SPARKPANEL__SAMPLING__INTERVAL_SECS=10`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::alerts::DEFAULT_ALERT_CAPACITY;
use crate::error::{ConfigError, ConfigResult};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::thresholds::Thresholds;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SPARKPANEL";

/// Main configuration structure for the monitor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sampler timing and retention
    pub sampling: SamplingConfig,

    /// Initial alert thresholds
    pub thresholds: Thresholds,

    /// Host collector settings
    pub collector: CollectorConfig,

    /// Monitored application probe
    pub application: ApplicationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seconds between sampling iterations
    pub interval_secs: u64,

    /// Entries retained per metric category
    pub history_capacity: usize,

    /// Alerts retained by the alert log
    pub alert_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Mount point whose usage is reported as the disk category
    pub disk_mount_point: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Canned game-server readings
    Simulated,
    /// Live readings over RCON
    Rcon,
    /// No probe; the placeholder record is always used
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub probe: ProbeKind,
    pub rcon_host: String,
    pub rcon_port: u16,
    pub rcon_password: String,
    /// Upper bound for each probe network step
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,

    /// Emit JSON formatted log lines
    pub json: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            alert_capacity: DEFAULT_ALERT_CAPACITY,
        }
    }
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            disk_mount_point: PathBuf::from("/"),
        }
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            probe: ProbeKind::Simulated,
            rcon_host: "127.0.0.1".to_string(),
            rcon_port: 25575,
            rcon_password: String::new(),
            timeout_secs: 3,
        }
    }
}

impl ApplicationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        })?;

        let config: MonitorConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                reason: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load with fallback order: env -> file -> defaults
    pub fn load<P: AsRef<Path>>(config_path: Option<P>) -> ConfigResult<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = config_path {
            let path = path.as_ref();
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: MonitorConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::ParseError {
                reason: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sampling.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sampling.interval_secs".to_string(),
                value: "0".to_string(),
            });
        }

        if self.sampling.history_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sampling.history_capacity".to_string(),
                value: "0".to_string(),
            });
        }

        if self.sampling.alert_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sampling.alert_capacity".to_string(),
                value: "0".to_string(),
            });
        }

        for (category, value) in self.thresholds.iter() {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: format!("thresholds.{}", category),
                    value: value.to_string(),
                });
            }
        }

        if self.application.probe == ProbeKind::Rcon {
            if self.application.rcon_host.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "application.rcon_host".to_string(),
                    value: String::new(),
                });
            }
            if self.application.timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "application.timeout_secs".to_string(),
                    value: "0".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("sparkpanel").join("monitor.toml"))
            .ok_or_else(|| ConfigError::ValidationFailed {
                reason: "Unable to determine config directory".to_string(),
            })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::ValidationFailed {
                reason: format!("Unable to create config directory: {}", parent.display()),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationFailed {
            reason: e.to_string(),
        })?;

        fs::write(path, content).map_err(|_| ConfigError::PermissionDenied {
            path: path.to_string_lossy().to_string(),
        })?;

        Ok(())
    }
}
