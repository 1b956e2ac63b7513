use crate::error::{CliError, Result};
use crate::output::OutputManager;
use clap::Args;
use sparkpanel_monitor::{MetricCategory, MonitorConfig};

#[derive(Args, Debug)]
pub struct ThresholdsArgs {
    /// Preview an override without saving it, e.g. --set cpu=75
    #[arg(long, value_parser = parse_override)]
    pub set: Vec<(MetricCategory, f64)>,
}

fn parse_override(raw: &str) -> std::result::Result<(MetricCategory, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=VALUE, got '{}'", raw))?;
    let category: MetricCategory = key.trim().parse()?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid threshold value '{}'", value))?;
    Ok((category, value))
}

pub async fn run(args: ThresholdsArgs, config: MonitorConfig, output: OutputManager) -> Result<()> {
    let mut thresholds = config.thresholds;
    for (category, value) in args.set {
        thresholds
            .set(category, value)
            .map_err(|e| CliError::Validation(e.to_string()))?;
    }
    output.print_thresholds(&thresholds)
}
