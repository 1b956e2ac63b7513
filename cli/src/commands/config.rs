use crate::error::{CliError, Result};
use crate::output::{OutputFormat, OutputManager};
use crate::utils;
use clap::Args;
use sparkpanel_monitor::MonitorConfig;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration action
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (defaults, file and environment merged)
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path (defaults to the active config file)
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Print the configuration file path
    Path,
}

pub async fn run(
    args: ConfigArgs,
    config_flag: Option<&str>,
    output: OutputManager,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = utils::load_config(config_flag)?;
            show_config(&config, &output)
        }
        ConfigAction::Init { force } => {
            let path = utils::resolve_config_path(config_flag)?;
            init_config(&path, force, &output)
        }
        ConfigAction::Validate { file } => {
            let path = utils::resolve_config_path(file.as_deref().or(config_flag))?;
            validate_config(&path, &output)
        }
        ConfigAction::Path => {
            let path = utils::resolve_config_path(config_flag)?;
            output.print_key_value("config_path", &path.to_string_lossy())
        }
    }
}

fn show_config(config: &MonitorConfig, output: &OutputManager) -> Result<()> {
    match output.format() {
        OutputFormat::Json => output.print_json(config),
        OutputFormat::Table => {
            let rendered = toml::to_string_pretty(config)
                .map_err(|e| CliError::Validation(e.to_string()))?;
            print!("{}", rendered);
            Ok(())
        }
    }
}

fn init_config(path: &Path, force: bool, output: &OutputManager) -> Result<()> {
    if path.exists() && !force {
        output.print_warning(&format!(
            "Configuration already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    MonitorConfig::default().save_to_file(path)?;
    output.print_success(&format!("Wrote default configuration to {}", path.display()))
}

fn validate_config(path: &Path, output: &OutputManager) -> Result<()> {
    if !path.exists() {
        return Err(CliError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        });
    }

    MonitorConfig::from_file(path)?;
    output.print_success(&format!("Configuration at {} is valid", path.display()))
}
