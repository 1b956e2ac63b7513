use crate::error::Result;
use crate::utils::{format_bytes, format_duration, format_timestamp};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use sparkpanel_monitor::history::HistoryEntry;
use sparkpanel_monitor::snapshot::{
    ApplicationReading, CpuReading, DiskReading, MemoryReading, NetworkReading,
};
use sparkpanel_monitor::thresholds::MIN_TICK_RATE;
use sparkpanel_monitor::{AlertRecord, CategoryRecord, MetricCategory, Severity, Snapshot, Thresholds};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputManager {
    format: OutputFormat,
    colored: bool,
    quiet: bool,
}

impl OutputManager {
    pub fn new(format: OutputFormat, colored: bool, quiet: bool) -> Self {
        Self {
            format,
            colored,
            quiet,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn heading(&self, title: &str) {
        if self.colored {
            println!("{}", style(title).bold().underlined());
        } else {
            println!("{}", title);
        }
    }

    fn row(&self, key: &str, value: &str) {
        if self.colored {
            println!("  {:<18} {}", style(key).bold().blue(), value);
        } else {
            println!("  {:<18} {}", key, value);
        }
    }

    fn percent(&self, value: f64, limit: Option<f64>) -> String {
        let text = format!("{:.1}%", value);
        if !self.colored {
            return text;
        }
        match limit {
            Some(limit) if value > limit => style(text).red().bold().to_string(),
            Some(limit) if value > limit * 0.9 => style(text).yellow().to_string(),
            _ => style(text).green().to_string(),
        }
    }

    pub fn print_snapshot(&self, snapshot: &Snapshot, thresholds: &Thresholds) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.print_json(snapshot);
        }

        self.heading(&format!("Snapshot at {}", format_timestamp(&snapshot.timestamp)));
        for record in snapshot.records() {
            self.print_record(&record, thresholds);
        }
        Ok(())
    }

    /// Latest record per category, as held by the monitor's history
    pub fn print_current(
        &self,
        current: &BTreeMap<MetricCategory, CategoryRecord>,
        thresholds: &Thresholds,
    ) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.print_json(current);
        }

        self.heading("Latest readings");
        if current.is_empty() {
            println!("  (no samples recorded)");
        }
        for record in current.values() {
            self.print_record(record, thresholds);
        }
        Ok(())
    }

    fn print_record(&self, record: &CategoryRecord, thresholds: &Thresholds) {
        match record {
            CategoryRecord::Cpu(cpu) => self.print_cpu(cpu, thresholds.cpu),
            CategoryRecord::Memory(memory) => self.print_memory(memory, thresholds.memory),
            CategoryRecord::Disk(disk) => self.print_disk(disk, thresholds.disk),
            CategoryRecord::Network(network) => self.print_network(network),
            CategoryRecord::Application(app) => self.print_application(app),
        }
    }

    fn print_cpu(&self, cpu: &CpuReading, limit: f64) {
        self.row(
            "cpu",
            &format!(
                "{} ({} cores, {} MHz)",
                self.percent(cpu.percent, Some(limit)),
                cpu.cores,
                cpu.frequency_mhz
            ),
        );
    }

    fn print_memory(&self, memory: &MemoryReading, limit: f64) {
        self.row(
            "memory",
            &format!(
                "{} ({} of {}, {} available)",
                self.percent(memory.percent, Some(limit)),
                format_bytes(memory.used_bytes),
                format_bytes(memory.total_bytes),
                format_bytes(memory.available_bytes)
            ),
        );
    }

    fn print_disk(&self, disk: &DiskReading, limit: f64) {
        self.row(
            "disk",
            &format!(
                "{} ({} free of {})",
                self.percent(disk.percent, Some(limit)),
                format_bytes(disk.free_bytes),
                format_bytes(disk.total_bytes)
            ),
        );
    }

    fn print_network(&self, network: &NetworkReading) {
        self.row(
            "network",
            &format!(
                "sent {} ({} pkts), received {} ({} pkts)",
                format_bytes(network.bytes_sent),
                network.packets_sent,
                format_bytes(network.bytes_recv),
                network.packets_recv
            ),
        );
    }

    fn print_application(&self, app: &ApplicationReading) {
        if !app.online {
            self.row("application", "offline");
            return;
        }
        let tps = format!("{:.1} TPS", app.tick_rate);
        let tps = if self.colored && app.tick_rate < MIN_TICK_RATE {
            style(tps).red().bold().to_string()
        } else {
            tps
        };
        self.row(
            "application",
            &format!(
                "{}/{} players, {}, up {}, {} chunks, {} entities",
                app.players_online,
                app.players_max,
                tps,
                format_duration(app.uptime_secs),
                app.chunks_loaded,
                app.entities
            ),
        );
    }

    pub fn print_history(&self, category: MetricCategory, entries: &[HistoryEntry]) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.print_json(entries);
        }

        self.heading(&format!("History: {} (last {})", category, entries.len()));
        for entry in entries {
            let summary = match &entry.record {
                CategoryRecord::Cpu(cpu) => format!("{:.1}%", cpu.percent),
                CategoryRecord::Memory(memory) => format!("{:.1}%", memory.percent),
                CategoryRecord::Disk(disk) => format!("{:.1}%", disk.percent),
                CategoryRecord::Network(net) => format!(
                    "tx {} rx {}",
                    format_bytes(net.bytes_sent),
                    format_bytes(net.bytes_recv)
                ),
                CategoryRecord::Application(app) => {
                    format!("{}/{} players, {:.1} TPS", app.players_online, app.players_max, app.tick_rate)
                }
            };
            println!("  {}  {}", entry.timestamp.format("%H:%M:%S"), summary);
        }
        Ok(())
    }

    pub fn print_alerts(&self, alerts: &[AlertRecord]) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.print_json(alerts);
        }

        self.heading(&format!("Alerts ({})", alerts.len()));
        if alerts.is_empty() {
            println!("  (none)");
        }
        for alert in alerts {
            self.print_alert(alert)?;
        }
        Ok(())
    }

    /// One alert line; JSON mode emits one compact object per line
    pub fn print_alert(&self, alert: &AlertRecord) -> Result<()> {
        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string(alert)?);
            return Ok(());
        }

        let severity = if self.colored {
            match alert.severity {
                Severity::Critical => style(alert.severity.as_str()).red().bold().to_string(),
                Severity::Warning => style(alert.severity.as_str()).yellow().bold().to_string(),
            }
        } else {
            alert.severity.to_string()
        };

        println!(
            "  {} {:<8} {:<11} {}",
            alert.timestamp.format("%H:%M:%S"),
            severity,
            alert.category,
            alert.message
        );
        Ok(())
    }

    pub fn print_thresholds(&self, thresholds: &Thresholds) -> Result<()> {
        if self.format == OutputFormat::Json {
            let mut map = serde_json::to_value(thresholds)?;
            if let Some(obj) = map.as_object_mut() {
                obj.insert("min_tick_rate".to_string(), MIN_TICK_RATE.into());
            }
            return self.print_json(&map);
        }

        self.heading("Alert thresholds");
        for (category, value) in thresholds.iter() {
            self.row(category.as_str(), &format!("> {:.1}%", value));
        }
        self.row("application", &format!("< {:.1} TPS (fixed)", MIN_TICK_RATE));
        Ok(())
    }

    pub fn print_key_value(&self, key: &str, value: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let mut map = BTreeMap::new();
                map.insert(key, value);
                self.print_json(&map)?;
            }
            OutputFormat::Table => {
                if self.colored {
                    println!("{}: {}", style(key).bold().blue(), style(value).green());
                } else {
                    println!("{}: {}", key, value);
                }
            }
        }
        Ok(())
    }

    pub fn print_success(&self, message: &str) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        if self.colored {
            println!("{} {}", style("✓").green().bold(), message);
        } else {
            println!("✓ {}", message);
        }
        Ok(())
    }

    pub fn print_warning(&self, message: &str) -> Result<()> {
        if self.colored {
            eprintln!("{} {}", style("⚠").yellow().bold(), message);
        } else {
            eprintln!("⚠ {}", message);
        }
        Ok(())
    }

    pub fn print_info(&self, message: &str) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        if self.colored {
            eprintln!("{} {}", style("ℹ").blue().bold(), message);
        } else {
            eprintln!("ℹ {}", message);
        }
        Ok(())
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if self.quiet || self.format == OutputFormat::Json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}
