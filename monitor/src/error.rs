//! Error handling for the SparkPanel monitor
//!
//! Faults inside a sampling cycle never escape the sampler; these types are
//! what the public operations (configuration, threshold updates, probes,
//! metrics export) report to their callers.

use std::io;

use thiserror::Error;

use crate::snapshot::MetricCategory;

/// The main error type for the monitoring core
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application probe errors
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// Threshold update rejected
    #[error("Invalid threshold for {category}: {value}")]
    InvalidThreshold { category: MetricCategory, value: f64 },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Generic(String),
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration file permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Configuration parsing error: {reason}")]
    ParseError { reason: String },
}

/// Application probe errors
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Not connected to the application")]
    NotConnected,

    #[error("Connection to {address} failed: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Authentication rejected by {address}")]
    AuthenticationFailed { address: String },

    #[error("Probe timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Malformed packet: {reason}")]
    MalformedPacket { reason: String },

    #[error("Unexpected response to '{command}': {response}")]
    UnexpectedResponse { command: String, response: String },

    #[error("Probe I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Metrics related errors
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Metric registration failed: {name}")]
    RegistrationFailed { name: String },

    #[error("Metrics export failed: {reason}")]
    ExportFailed { reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MonitorError>;

/// A specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// A specialized result type for probe operations
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// A specialized result type for metrics operations
pub type MetricsResult<T> = std::result::Result<T, MetricsError>;

impl MonitorError {
    /// Check if the sampler can keep going after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            MonitorError::Config(_) => false,
            MonitorError::InvalidThreshold { .. } => false,
            MonitorError::Io(io_error) => matches!(
                io_error.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            _ => true,
        }
    }

    /// Get the error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            MonitorError::Config(_) => "config",
            MonitorError::Probe(_) => "probe",
            MonitorError::Metrics(_) => "metrics",
            MonitorError::InvalidThreshold { .. } => "threshold",
            MonitorError::Io(_) => "io",
            MonitorError::Serialization(_) => "serialization",
            MonitorError::Generic(_) => "generic",
        }
    }
}

impl From<String> for MonitorError {
    fn from(msg: String) -> Self {
        MonitorError::Generic(msg)
    }
}

impl From<&str> for MonitorError {
    fn from(msg: &str) -> Self {
        MonitorError::Generic(msg.to_string())
    }
}

impl From<prometheus::Error> for MetricsError {
    fn from(err: prometheus::Error) -> Self {
        MetricsError::RegistrationFailed { name: err.to_string() }
    }
}
