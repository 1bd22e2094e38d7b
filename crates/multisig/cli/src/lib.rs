//! Multisig CLI - operator tooling for the multisig approval engine
//!
//! - `check-config`: validate an engine config and summarize the quorum
//! - `simulate`: replay a scenario of timed operations and print the
//!   resulting proposals, quorum and audit journal as JSON

use clap::{Parser, Subcommand};
use multisig_runtime::EngineConfig;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;
pub mod scenario;

pub use error::{CliError, CliResult};
pub use scenario::{run_scenario, Scenario, SimulationReport};

/// multisigctl application
#[derive(Parser)]
#[command(name = "multisigctl")]
#[command(about = "Multisig approval engine tooling", long_about = None)]
#[command(version)]
struct Cli {
    /// Engine configuration file
    #[arg(short, long, env = "MULTISIG_CONFIG", default_value = "multisig.toml")]
    config: PathBuf,

    /// Log level
    #[arg(long, env = "MULTISIG_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "MULTISIG_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print a summary
    CheckConfig,

    /// Replay a scenario file against a fresh engine
    Simulate {
        /// Scenario TOML file
        script: PathBuf,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },
}

/// Run using the current process arguments.
pub async fn run() -> CliResult<()> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing(&cli.log_level, cli.json_logs);

    let config = load_config(&cli.config).await?;

    match cli.command {
        Commands::CheckConfig => {
            let summary = config_summary(&config);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Simulate { script, pretty } => {
            let raw = tokio::fs::read_to_string(&script).await?;
            let scenario = Scenario::from_toml_str(&raw)?;
            info!(script = %script.display(), steps = scenario.steps.len(), "Replaying scenario");

            let report = run_scenario(config, &scenario)?;
            let out = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", out);
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.to_string().into());

    // A subscriber may already be installed when embedded or under test
    let _ = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}

async fn load_config(path: &Path) -> CliResult<EngineConfig> {
    let raw = tokio::fs::read_to_string(path).await?;
    let config = EngineConfig::from_toml_str(&raw)?;
    info!(config = %path.display(), "Configuration loaded");
    Ok(config)
}

/// JSON summary printed by `check-config`
pub fn config_summary(config: &EngineConfig) -> serde_json::Value {
    serde_json::json!({
        "valid": true,
        "members": config.quorum.members.len(),
        "total_power": config.quorum.total_power(),
        "rule": config.quorum.rule,
        "voting": config.voting,
        "listing": config.listing,
    })
}
