//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;
use tank_traits::ModeCommand;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "tank", version, about = "Tank level dashboard client")]
pub struct Cli {
    /// Path to config TOML (a missing file means defaults)
    #[arg(long, value_name = "FILE", default_value = "etc/tank_dashboard.toml")]
    pub config: PathBuf,

    /// Override api.base_url, e.g. http://10.0.0.5:8080/api
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Override polling.status_ms
    #[arg(long, value_name = "MS")]
    pub status_ms: Option<u64>,

    /// Override polling.history_ms
    #[arg(long, value_name = "MS")]
    pub history_ms: Option<u64>,

    /// Talk to an in-process simulated tank instead of the HTTP API
    #[arg(long, action = ArgAction::SetTrue)]
    pub simulate: bool,

    /// Log as JSON lines and print results as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Mode an operator may request from the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    Automatic,
    Manual,
}

impl From<ModeArg> for ModeCommand {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Automatic => Self::Automatic,
            ModeArg::Manual => Self::Manual,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Live dashboard; reads operator commands from stdin
    Watch {
        /// Append frames instead of redrawing the screen
        #[arg(long, action = ArgAction::SetTrue)]
        no_clear: bool,
    },
    /// Fetch and print one status snapshot
    Status,
    /// Fetch and print the water level history
    History,
    /// Switch the controller mode
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Set the valve opening (only accepted in MANUAL); values are clamped to 0..=100
    Valve {
        #[arg(allow_negative_numbers = true)]
        opening: i64,
    },
    /// Load and validate the config, then print the effective values
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_valve_parses() {
        let cli = Cli::try_parse_from(["tank", "valve", "-5"]).unwrap();
        assert!(matches!(cli.cmd, Commands::Valve { opening: -5 }));
    }
}
