//! `watch`: live dashboard driven by operator commands on stdin.

use std::io::{BufRead, IsTerminal};
use tank_core::{Intent, SessionBuilder, SessionCfg, SharedApi};
use tank_traits::Mode;
use tank_ui::{Style, TextRenderer};

pub const HELP: &str = "commands: auto | manual | grab | release | edit <0-100> | drag <0-100> | apply | set <0-100> | quit";

/// Parse one operator line. Values are not range-checked here; the slider
/// clamps them.
pub fn parse_line(line: &str) -> Result<Vec<Intent>, String> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Ok(Vec::new());
    };
    let mut value = || -> Result<i64, String> {
        let raw = words
            .next()
            .ok_or_else(|| format!("`{cmd}` needs a value"))?;
        raw.parse::<i64>()
            .map_err(|_| format!("`{raw}` is not a whole number"))
    };
    let intents = match cmd.to_ascii_lowercase().as_str() {
        "auto" | "automatic" => vec![Intent::RequestMode(Mode::Automatic)],
        "manual" => vec![Intent::RequestMode(Mode::Manual)],
        "grab" => vec![Intent::InteractionStart],
        "release" => vec![Intent::InteractionEnd],
        "edit" => vec![Intent::Edit(value()?)],
        "drag" => vec![Intent::InteractionStart, Intent::Edit(value()?)],
        "apply" => vec![Intent::Commit],
        "set" => vec![Intent::Edit(value()?), Intent::Commit],
        "quit" | "exit" | "q" => vec![Intent::Quit],
        other => return Err(format!("unknown command `{other}`; {HELP}")),
    };
    Ok(intents)
}

pub fn run_watch(api: SharedApi, cfg: SessionCfg, no_clear: bool) -> eyre::Result<()> {
    let tty = std::io::stdout().is_terminal();
    let renderer = TextRenderer::new(std::io::stdout(), Style { color: tty }).clearing(tty && !no_clear);
    let mut runner = SessionBuilder::new()
        .api(api)
        .renderer(Box::new(renderer))
        .config(cfg)
        .build()?;

    let handle = runner.handle();
    {
        let handle = handle.clone();
        ctrlc::set_handler(move || handle.request_stop())
            .map_err(|e| eyre::eyre!("failed to set Ctrl-C handler: {e}"))?;
    }

    // Not joined: a blocked stdin read must not hold up exit.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_line(&line) {
                Ok(intents) => {
                    for intent in intents {
                        if handle.send(intent).is_err() {
                            return;
                        }
                    }
                }
                Err(msg) => eprintln!("{msg}"),
            }
        }
        tracing::debug!("stdin closed");
    });

    tracing::info!("dashboard session started");
    runner.run()?;
    tracing::info!("dashboard session ended");
    Ok(())
}
