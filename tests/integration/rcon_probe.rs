//! RCON probe against an in-process fake server

use std::sync::Arc;
use std::time::Duration;

use sparkpanel_monitor::collector::MetricsSource;
use sparkpanel_monitor::config::ProbeKind;
use sparkpanel_monitor::error::ProbeError;
use sparkpanel_monitor::probe::ApplicationProbe;
use sparkpanel_monitor::snapshot::NOMINAL_TICK_RATE;
use sparkpanel_monitor::{MonitorConfig, RconProbe, SystemCollector};
use sparkpanel_tests::{init_test_environment, FakeRconOptions, FakeRconServer};

fn probe_for(server: &FakeRconServer, password: &str, timeout: Duration) -> RconProbe {
    RconProbe::new(&server.host(), server.port(), password, timeout)
}

#[tokio::test]
async fn test_status_parses_players_and_tps() {
    init_test_environment();
    let server = FakeRconServer::start(FakeRconOptions::default()).await.unwrap();
    let probe = probe_for(&server, "hunter2", Duration::from_secs(2));

    let reading = probe.status().await.unwrap();
    assert!(reading.online);
    assert_eq!(reading.players_online, 7);
    assert_eq!(reading.players_max, 30);
    assert_eq!(reading.tick_rate, 19.5);
}

#[tokio::test]
async fn test_session_is_reused() {
    init_test_environment();
    let server = FakeRconServer::start(FakeRconOptions::default()).await.unwrap();
    let probe = probe_for(&server, "hunter2", Duration::from_secs(2));

    probe.status().await.unwrap();
    probe.status().await.unwrap();

    assert_eq!(server.connections(), 1);
    assert_eq!(server.commands(), 4);
}

#[tokio::test]
async fn test_wrong_password_is_reported_and_retried() {
    init_test_environment();
    let server = FakeRconServer::start(FakeRconOptions::default()).await.unwrap();
    let probe = probe_for(&server, "guess", Duration::from_secs(2));

    let err = probe.status().await.unwrap_err();
    assert!(matches!(err, ProbeError::AuthenticationFailed { .. }));

    assert!(probe.status().await.is_err());
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn test_unresponsive_server_times_out() {
    init_test_environment();
    let options = FakeRconOptions {
        stall_commands: true,
        ..FakeRconOptions::default()
    };
    let server = FakeRconServer::start(options).await.unwrap();
    let probe = probe_for(&server, "hunter2", Duration::from_millis(300));

    let started = std::time::Instant::now();
    let err = probe.status().await.unwrap_err();
    assert!(matches!(err, ProbeError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_server_without_tps_command_reports_nominal_rate() {
    init_test_environment();
    let mut options = FakeRconOptions::default();
    options.responses.remove("tps");
    options.responses.insert(
        "list".to_string(),
        "There are 0 of a max 10 players online:".to_string(),
    );
    let server = FakeRconServer::start(options).await.unwrap();
    let probe = probe_for(&server, "hunter2", Duration::from_secs(2));

    let reading = probe.status().await.unwrap();
    assert_eq!(reading.players_max, 10);
    assert_eq!(reading.tick_rate, NOMINAL_TICK_RATE);
}

#[tokio::test]
async fn test_unreachable_server() {
    init_test_environment();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let probe = RconProbe::new("127.0.0.1", port, "hunter2", Duration::from_secs(2));
    let err = probe.status().await.unwrap_err();
    assert!(matches!(
        err,
        ProbeError::ConnectionFailed { .. } | ProbeError::Timeout { .. }
    ));
}

#[tokio::test]
async fn test_collector_uses_configured_rcon_probe() {
    init_test_environment();
    let server = FakeRconServer::start(FakeRconOptions::default()).await.unwrap();

    let mut config = MonitorConfig::default();
    config.application.probe = ProbeKind::Rcon;
    config.application.rcon_host = server.host();
    config.application.rcon_port = server.port();
    config.application.rcon_password = "hunter2".to_string();

    let collector = SystemCollector::from_config(&config);
    let snapshot = collector.collect().await;
    assert!(snapshot.application.online);
    assert_eq!(snapshot.application.players_online, 7);

    config.application.rcon_password = "wrong".to_string();
    let collector = Arc::new(SystemCollector::from_config(&config));
    let snapshot = collector.collect().await;
    assert!(!snapshot.application.online);
    assert_eq!(snapshot.application.tick_rate, NOMINAL_TICK_RATE);
}
