use clap::{CommandFactory, Parser, Subcommand};
use std::process;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;
mod utils;

use commands::*;
use error::Result;
use output::{OutputFormat, OutputManager};
use sparkpanel_monitor::config::LoggingConfig;

#[derive(Parser)]
#[command(name = "sparkctl")]
#[command(about = "SparkPanel monitor - host and game server resource monitoring")]
#[command(version)]
#[command(long_about = "
sparkctl samples CPU, memory, disk, network and game server metrics, raises
threshold alerts and keeps a bounded in-memory history while it runs.

Examples:
  sparkctl snapshot                          # Collect and print one snapshot
  sparkctl watch --interval 2 --duration 60  # Sample for a minute, print alerts live
  sparkctl thresholds --set cpu=70           # Preview thresholds with an override
  sparkctl config init                       # Write a default config file
")]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormatArg,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file path
    #[arg(long, global = true, env = "SPARKPANEL_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormatArg {
    Table,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Collect one snapshot and print every category
    Snapshot(SnapshotArgs),

    /// Run the background sampler and stream alerts
    Watch(WatchArgs),

    /// Show alert thresholds
    Thresholds(ThresholdsArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell);
        return;
    }

    if let Err(e) = run_command(cli).await {
        eprintln!("{}", error::format_error(&e));
        process::exit(e.exit_code());
    }
}

async fn run_command(cli: Cli) -> Result<()> {
    let colored =
        !cli.no_color && !cli.quiet && console::Term::stdout().features().colors_supported();
    let output = OutputManager::new(OutputFormat::from(cli.format.clone()), colored, cli.quiet);

    let flags = cli_log_flags(&cli);

    if let Commands::Config(args) = cli.command {
        init_logging(&flags, None);
        return commands::config::run(args, cli.config.as_deref(), output).await;
    }

    let config = match utils::load_config(cli.config.as_deref()) {
        Ok(config) => {
            init_logging(&flags, Some(&config.logging));
            config
        }
        Err(e) => {
            init_logging(&flags, None);
            return Err(e);
        }
    };
    info!("SparkPanel CLI started");

    match cli.command {
        Commands::Snapshot(args) => commands::snapshot::run(args, config, output).await,
        Commands::Watch(args) => commands::watch::run(args, config, output).await,
        Commands::Thresholds(args) => commands::thresholds::run(args, config, output).await,
        Commands::Config(_) | Commands::Completions { .. } => {
            unreachable!("handled before configuration is loaded")
        }
    }
}

struct LogFlags {
    debug: bool,
    verbose: bool,
    quiet: bool,
    json: bool,
}

fn cli_log_flags(cli: &Cli) -> LogFlags {
    LogFlags {
        debug: cli.debug,
        verbose: cli.verbose,
        quiet: cli.quiet,
        json: cli.json_logs,
    }
}

/// Resolve the default filter: CLI flags win over the configured level
fn log_directive(flags: &LogFlags, logging: Option<&LoggingConfig>) -> String {
    let level = if flags.debug {
        "debug"
    } else if flags.verbose {
        "info"
    } else if flags.quiet {
        "error"
    } else {
        match logging {
            Some(logging) => logging.level.as_str(),
            None => "warn",
        }
    };
    format!("sparkctl={level},sparkpanel_monitor={level}")
}

fn init_logging(flags: &LogFlags, logging: Option<&LoggingConfig>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_directive(flags, logging).into());
    let json = flags.json || logging.map_or(false, |l| l.json);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::{generate, Generator};
    use std::io;

    fn print_completions<G: Generator>(gen: G, cmd: &mut clap::Command) {
        generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    }

    let mut cmd = Cli::command();
    eprintln!("Generating completion file for {shell}...");
    print_completions(shell, &mut cmd);
}
