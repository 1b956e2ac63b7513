use crate::error::Result;
use crate::output::{OutputFormat, OutputManager};
use clap::Args;
use serde_json::json;
use sparkpanel_monitor::collector::{MetricsSource, SystemCollector};
use sparkpanel_monitor::thresholds::evaluate;
use sparkpanel_monitor::{MetricCategory, MonitorConfig};

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Only show one category (cpu, memory, disk, network, application)
    #[arg(long, short)]
    pub category: Option<MetricCategory>,

    /// Skip the game server probe
    #[arg(long)]
    pub no_probe: bool,
}

pub async fn run(args: SnapshotArgs, config: MonitorConfig, output: OutputManager) -> Result<()> {
    let mut config = config;
    if args.no_probe {
        config.application.probe = sparkpanel_monitor::ProbeKind::Disabled;
    }

    let spinner = output.create_spinner("Collecting metrics...");
    let collector = SystemCollector::from_config(&config);
    let snapshot = collector.collect().await;
    spinner.finish_and_clear();

    let alerts = evaluate(&snapshot, &config.thresholds);

    if let Some(category) = args.category {
        let record = snapshot.record(category);
        if output.format() == OutputFormat::Json {
            return output.print_json(&record);
        }
        let mut current = std::collections::BTreeMap::new();
        current.insert(category, record);
        return output.print_current(&current, &config.thresholds);
    }

    if output.format() == OutputFormat::Json {
        return output.print_json(&json!({
            "snapshot": snapshot,
            "alerts": alerts,
        }));
    }

    output.print_snapshot(&snapshot, &config.thresholds)?;
    if alerts.is_empty() {
        output.print_success("All readings within thresholds")?;
    } else {
        println!();
        output.print_alerts(&alerts)?;
    }
    Ok(())
}
