use crate::error::{CliError, Result};
use crate::output::OutputManager;
use clap::Args;
use sparkpanel_monitor::{AlertRecord, MetricCategory, MonitorConfig, ResourceMonitor};
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Sampling interval in seconds (defaults to the configured interval)
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long, short)]
    pub duration: Option<u64>,

    /// Number of history entries to print per category on exit
    #[arg(long, default_value = "0")]
    pub history: usize,

    /// Print the Prometheus metrics on exit
    #[arg(long)]
    pub metrics: bool,
}

/// Why the watch loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Interrupted,
    Elapsed,
}

impl StopReason {
    /// Ctrl-C still prints the summary but exits with the cancellation code
    fn into_result(self) -> Result<()> {
        match self {
            StopReason::Interrupted => Err(CliError::Cancelled),
            StopReason::Elapsed => Ok(()),
        }
    }
}

pub async fn run(args: WatchArgs, config: MonitorConfig, output: OutputManager) -> Result<()> {
    let interval = match args.interval {
        Some(0) => {
            return Err(CliError::Validation(
                "interval must be at least 1 second".to_string(),
            ))
        }
        Some(secs) => Duration::from_secs(secs),
        None => config.sampling.interval(),
    };

    let monitor = ResourceMonitor::from_config(&config)?;

    let printer = output.clone();
    monitor
        .subscribe(move |alert: &AlertRecord| -> anyhow::Result<()> {
            printer.print_alert(alert)?;
            Ok(())
        })
        .await;

    monitor.start(interval).await;
    output.print_info(&format!(
        "Sampling every {}s, press Ctrl-C to stop",
        interval.as_secs()
    ))?;

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    let reason = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping monitor");
            StopReason::Interrupted
        }
        _ = deadline => {
            info!("Watch duration elapsed");
            StopReason::Elapsed
        }
    };

    monitor.stop().await;

    let thresholds = monitor.thresholds().await;
    println!();
    output.print_current(&monitor.current_metrics().await, &thresholds)?;

    if args.history > 0 {
        for category in MetricCategory::ALL {
            let entries = monitor.metrics_history(category, Some(args.history)).await;
            println!();
            output.print_history(category, &entries)?;
        }
    }

    println!();
    output.print_alerts(&monitor.alerts(None).await)?;

    if args.metrics {
        println!();
        print!("{}", monitor.metrics().export().map_err(sparkpanel_monitor::MonitorError::from)?);
    }

    reason.into_result()
}
