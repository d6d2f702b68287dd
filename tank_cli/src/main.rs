mod cli;
mod error_fmt;
mod logging;
mod oneshot;
mod watch;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use std::sync::Arc;
use tank_core::{ApiCfg, SessionCfg, SharedApi};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        tracing::debug!(error = ?err, "exiting with error");
        std::process::exit(exit_code_for_error(&err));
    }
}

/// Command-line values take precedence over the file.
fn apply_overrides(cfg: &mut tank_config::Config, cli: &Cli) {
    if let Some(url) = &cli.base_url {
        cfg.api.base_url = url.clone();
    }
    if let Some(ms) = cli.status_ms {
        cfg.polling.status_ms = ms;
    }
    if let Some(ms) = cli.history_ms {
        cfg.polling.history_ms = ms;
    }
}

fn make_api(cli: &Cli, cfg: &tank_config::Config) -> SharedApi {
    if cli.simulate {
        tracing::info!("using simulated tank");
        return Arc::new(tank_http::SimulatedApi::new());
    }
    let api = ApiCfg::from(&cfg.api);
    tracing::debug!(base_url = %api.base_url, timeout = ?api.timeout, "using HTTP API");
    Arc::new(tank_http::HttpApi::new(&api.base_url, api.timeout))
}

fn run(cli: Cli) -> eyre::Result<()> {
    // Only the panic/report hooks are wanted; failures here are not fatal.
    let _ = color_eyre::install();

    let mut cfg = tank_config::load_file(&cli.config)?;
    apply_overrides(&mut cfg, &cli);
    cfg.validate()?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    let api = make_api(&cli, &cfg);
    match cli.cmd {
        Commands::Watch { no_clear } => watch::run_watch(api, SessionCfg::from(&cfg), no_clear),
        Commands::Status => oneshot::status(&api, cli.json),
        Commands::History => oneshot::history(&api, cli.json),
        Commands::Mode { mode } => oneshot::mode(&api, mode.into(), cli.json),
        Commands::Valve { opening } => oneshot::valve(&api, opening, cli.json),
        Commands::CheckConfig => {
            oneshot::check_config(&cfg, cli.json);
            Ok(())
        }
    }
}
