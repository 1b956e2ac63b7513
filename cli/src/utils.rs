use crate::error::{CliError, Result};
use chrono::{DateTime, Utc};
use sparkpanel_monitor::MonitorConfig;
use std::path::PathBuf;

/// Resolve the configuration file: explicit flag first, then the per-user default
pub fn resolve_config_path(explicit: Option<&str>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(MonitorConfig::default_config_path()?),
    }
}

/// Load layered configuration; a missing default file falls back to defaults
pub fn load_config(explicit: Option<&str>) -> Result<MonitorConfig> {
    let path = resolve_config_path(explicit)?;

    if explicit.is_some() && !path.exists() {
        return Err(CliError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        });
    }

    let config = MonitorConfig::load(Some(&path))?;
    if path.exists() {
        tracing::info!("Loaded configuration from: {}", path.display());
    } else {
        tracing::debug!("No configuration file at {}, using defaults", path.display());
    }
    Ok(config)
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format bytes into a human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

pub fn format_duration(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
