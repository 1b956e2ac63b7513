use sparkpanel_monitor::error::{ConfigError, MonitorError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation cancelled by user")]
    Cancelled,
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 1,
            CliError::Monitor(MonitorError::Config(_)) => 1,
            CliError::Io(_) => 2,
            CliError::FileNotFound { .. } => 5,
            CliError::Validation(_) => 6,
            CliError::Monitor(MonitorError::Probe(_)) => 9,
            CliError::Cancelled => 130, // SIGINT
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Format error for user-friendly display
pub fn format_error(error: &CliError) -> String {
    match error {
        CliError::Config(e) | CliError::Monitor(MonitorError::Config(e)) => {
            format!(
                "Configuration Error: {}\n\nTry running 'sparkctl config validate' to check your configuration.",
                e
            )
        }
        CliError::Monitor(MonitorError::Probe(e)) => {
            format!(
                "Game Server Error: {}\n\nCheck the [application] section of your configuration.",
                e
            )
        }
        CliError::FileNotFound { path } => {
            format!(
                "File Not Found: {}\n\nRun 'sparkctl config init' to create a default configuration.",
                path
            )
        }
        CliError::Cancelled => "Operation cancelled by user.".to_string(),
        _ => error.to_string(),
    }
}
