//! Start/stop behaviour of the background sampler

use std::sync::Arc;
use std::time::Duration;

use sparkpanel_monitor::{MetricCategory, MetricsSource, MonitorConfig, ResourceMonitor};
use sparkpanel_tests::{
    init_test_environment, snapshot_with, wait_until, ScriptedSource, SlowSource, Step,
    StubSource, DEFAULT_TEST_TIMEOUT,
};

fn monitor_over(source: Arc<dyn MetricsSource>) -> ResourceMonitor {
    ResourceMonitor::new(&MonitorConfig::default(), source).unwrap()
}

async fn cpu_history_len(monitor: &ResourceMonitor) -> usize {
    monitor
        .metrics_history(MetricCategory::Cpu, Some(usize::MAX))
        .await
        .len()
}

#[tokio::test]
async fn test_double_start_runs_one_worker() {
    init_test_environment();
    let source = Arc::new(StubSource::quiet());
    let monitor = monitor_over(source.clone());

    assert!(monitor.start(Duration::from_millis(100)).await);
    assert!(!monitor.start(Duration::from_millis(100)).await);
    assert!(monitor.is_running());

    tokio::time::sleep(Duration::from_millis(450)).await;
    monitor.stop().await;

    // One worker samples at t=0,100,..,400; a second would double that.
    let calls = source.calls();
    assert!((2..=6).contains(&calls), "unexpected sample count {}", calls);
    assert_eq!(cpu_history_len(&monitor).await, calls);
}

#[tokio::test]
async fn test_nothing_recorded_after_stop() {
    init_test_environment();
    let source = Arc::new(StubSource::new(99.0, 20.0, 30.0, 20.0));
    let monitor = monitor_over(source.clone());

    monitor.start(Duration::from_millis(20)).await;
    assert!(wait_until(DEFAULT_TEST_TIMEOUT, || async { source.calls() >= 2 }).await);
    monitor.stop().await;
    assert!(!monitor.is_running());

    let history = cpu_history_len(&monitor).await;
    let alerts = monitor.alerts(Some(usize::MAX)).await.len();
    let calls = source.calls();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(source.calls(), calls);
    assert_eq!(cpu_history_len(&monitor).await, history);
    assert_eq!(monitor.alerts(Some(usize::MAX)).await.len(), alerts);
}

#[tokio::test]
async fn test_stop_waits_for_in_flight_collection() {
    init_test_environment();
    let source = Arc::new(SlowSource::new(
        Duration::from_millis(200),
        StubSource::quiet(),
    ));
    let monitor = monitor_over(source.clone());

    monitor.start(Duration::from_millis(10)).await;
    assert!(wait_until(DEFAULT_TEST_TIMEOUT, || async { source.started() >= 1 }).await);
    monitor.stop().await;

    assert_eq!(source.finished(), source.started());
    assert_eq!(cpu_history_len(&monitor).await, source.finished());
}

#[tokio::test]
async fn test_stop_when_stopped_and_restart() {
    init_test_environment();
    let source = Arc::new(StubSource::quiet());
    let monitor = monitor_over(source.clone());

    monitor.stop().await;
    assert!(!monitor.is_running());

    for _ in 0..3 {
        assert!(monitor.start(Duration::from_millis(10)).await);
        let before = source.calls();
        assert!(wait_until(DEFAULT_TEST_TIMEOUT, || async { source.calls() > before }).await);
        monitor.stop().await;
        assert!(!monitor.is_running());
    }
}

#[tokio::test]
async fn test_faulty_iterations_do_not_stop_the_worker() {
    init_test_environment();
    let source = Arc::new(ScriptedSource::new(
        vec![
            Step::Panic("sensor unplugged"),
            Step::Emit(snapshot_with(10.0, 10.0, 10.0, 20.0)),
            Step::Panic("sensor unplugged again"),
        ],
        StubSource::quiet(),
    ));
    let monitor = monitor_over(source.clone());

    monitor.start(Duration::from_millis(10)).await;
    assert!(
        wait_until(DEFAULT_TEST_TIMEOUT, || async {
            cpu_history_len(&monitor).await >= 3
        })
        .await
    );
    assert!(monitor.is_running());
    monitor.stop().await;

    assert_eq!(source.remaining(), 0);
    assert_eq!(monitor.metrics().iteration_failures.get(), 2);
}

#[tokio::test]
async fn test_start_default_uses_configured_interval() {
    init_test_environment();
    let mut config = MonitorConfig::default();
    config.sampling.interval_secs = 1;
    let source = Arc::new(StubSource::quiet());
    let monitor = ResourceMonitor::new(&config, source.clone()).unwrap();

    assert_eq!(monitor.default_interval(), Duration::from_secs(1));
    assert!(monitor.start_default().await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    monitor.stop().await;

    // First sample is immediate, the second would be due after one second
    assert_eq!(source.calls(), 1);
}
