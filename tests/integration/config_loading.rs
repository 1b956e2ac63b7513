//! Layered configuration and its effect on a running monitor

use std::fs;
use std::path::PathBuf;

use sparkpanel_monitor::config::ProbeKind;
use sparkpanel_monitor::error::ConfigError;
use sparkpanel_monitor::{MetricCategory, MonitorConfig, ResourceMonitor, Severity};
use sparkpanel_tests::{init_test_environment, StubSource};
use tempfile::TempDir;

fn write_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("monitor.toml");
    fs::write(&path, content).expect("Failed to write config file");
    (temp_dir, path)
}

#[test]
fn test_full_file_is_parsed() {
    let (_dir, path) = write_config(
        r#"
[sampling]
interval_secs = 10
history_capacity = 500
alert_capacity = 20

[thresholds]
cpu = 75.0
memory = 80.0
disk = 95.0

[collector]
disk_mount_point = "/srv"

[application]
probe = "rcon"
rcon_host = "mc.internal"
rcon_port = 25580
rcon_password = "secret"
timeout_secs = 2

[logging]
level = "debug"
json = true
"#,
    );

    let config = MonitorConfig::from_file(&path).unwrap();
    assert_eq!(config.sampling.interval_secs, 10);
    assert_eq!(config.sampling.history_capacity, 500);
    assert_eq!(config.thresholds.disk, 95.0);
    assert_eq!(config.collector.disk_mount_point, PathBuf::from("/srv"));
    assert_eq!(config.application.probe, ProbeKind::Rcon);
    assert_eq!(config.application.rcon_port, 25580);
    assert!(config.logging.json);
}

#[test]
fn test_disabled_probe_spelling() {
    let (_dir, path) = write_config("[application]\nprobe = \"none\"\n");
    let config = MonitorConfig::from_file(&path).unwrap();
    assert_eq!(config.application.probe, ProbeKind::Disabled);
}

#[test]
fn test_invalid_files_are_rejected() {
    let (_dir, path) = write_config("[sampling]\ninterval_secs = \"soon\"\n");
    assert!(matches!(
        MonitorConfig::from_file(&path),
        Err(ConfigError::ParseError { .. })
    ));

    let (_dir, path) = write_config("[sampling]\nalert_capacity = 0\n");
    assert!(matches!(
        MonitorConfig::from_file(&path),
        Err(ConfigError::InvalidValue { field, .. }) if field == "sampling.alert_capacity"
    ));

    let (_dir, path) = write_config("[application]\nprobe = \"rcon\"\ntimeout_secs = 0\n");
    assert!(MonitorConfig::from_file(&path).is_err());
}

#[test]
fn test_environment_overrides_file() {
    let (_dir, path) = write_config("[sampling]\ninterval_secs = 10\nhistory_capacity = 42\n");

    std::env::set_var("SPARKPANEL__SAMPLING__INTERVAL_SECS", "3");
    let loaded = MonitorConfig::load(Some(&path));
    std::env::remove_var("SPARKPANEL__SAMPLING__INTERVAL_SECS");

    let config = loaded.unwrap();
    assert_eq!(config.sampling.interval_secs, 3);
    assert_eq!(config.sampling.history_capacity, 42);
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("monitor.toml");

    let mut config = MonitorConfig::default();
    config.thresholds.memory = 70.0;
    config.application.probe = ProbeKind::Disabled;
    config.save_to_file(&path).unwrap();

    assert_eq!(MonitorConfig::from_file(&path).unwrap(), config);
}

#[tokio::test]
async fn test_monitor_honours_configured_capacities() {
    init_test_environment();
    let (_dir, path) = write_config(
        "[sampling]\nhistory_capacity = 3\nalert_capacity = 5\n\n[thresholds]\ncpu = 5.0\n",
    );
    let config = MonitorConfig::from_file(&path).unwrap();
    let monitor = ResourceMonitor::with_source(&config, StubSource::quiet()).unwrap();

    for _ in 0..8 {
        monitor.sample_once().await;
    }

    assert_eq!(
        monitor
            .metrics_history(MetricCategory::Disk, Some(100))
            .await
            .len(),
        3
    );
    let alerts = monitor.alerts(Some(100)).await;
    assert_eq!(alerts.len(), 5);
    assert!(alerts
        .iter()
        .all(|a| a.category == MetricCategory::Cpu && a.severity == Severity::Warning));
}
