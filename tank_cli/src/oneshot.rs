//! Single-request subcommands: status, history, mode, valve, check-config.

use serde_json::json;
use tank_core::{ApiCfg, SessionCfg, SharedApi, Snapshot};
use tank_traits::ModeCommand;
use tank_ui::widgets;

fn print_json(v: &serde_json::Value) {
    println!("{v}");
}

pub fn status(api: &SharedApi, as_json: bool) -> eyre::Result<()> {
    let s: Snapshot = tank_core::fetch_status(api.as_ref())?;
    if as_json {
        print_json(&json!({
            "mode": s.mode.label(),
            "water_level": s.water_level,
            "valve_opening": s.valve_opening,
            "device_linked": s.device_linked,
            "server_time_ms": s.server_time_ms,
        }));
        return Ok(());
    }
    println!("Mode:          {}", s.mode);
    println!("Water level:   {:.2} cm", s.water_level);
    println!(
        "Valve opening: {} {}%",
        widgets::gauge(s.valve_opening, 20),
        s.valve_opening
    );
    println!(
        "Level sensor:  {}",
        if s.device_linked { "linked" } else { "no link" }
    );
    if let Some(ms) = s.server_time_ms {
        println!("Server time:   {}", widgets::clock_time(ms));
    }
    Ok(())
}

pub fn history(api: &SharedApi, as_json: bool) -> eyre::Result<()> {
    let points = tank_core::fetch_history(api.as_ref())?;
    if as_json {
        let readings: Vec<_> = points
            .iter()
            .map(|p| json!({ "timestamp_ms": p.timestamp_ms, "level": p.level }))
            .collect();
        print_json(&json!({ "count": readings.len(), "readings": readings }));
        return Ok(());
    }
    if points.is_empty() {
        println!("No readings yet.");
        return Ok(());
    }
    let levels: Vec<f32> = points.iter().map(|p| p.level).collect();
    println!("{}", widgets::sparkline(&levels, 60));
    for p in &points {
        println!("{}  {:>8.2} cm", widgets::clock_time(p.timestamp_ms), p.level);
    }
    println!("{} readings", points.len());
    Ok(())
}

pub fn mode(api: &SharedApi, mode: ModeCommand, as_json: bool) -> eyre::Result<()> {
    tank_core::send_mode(api.as_ref(), mode)?;
    tracing::info!(mode = mode.as_wire(), "mode command accepted");
    if as_json {
        print_json(&json!({ "ok": true, "mode": mode.as_wire() }));
    } else {
        println!("Mode change to {} accepted.", mode.as_wire());
    }
    Ok(())
}

pub fn valve(api: &SharedApi, opening: i64, as_json: bool) -> eyre::Result<()> {
    let sent = tank_core::send_valve(api.as_ref(), opening)?;
    tracing::info!(opening = sent, requested = opening, "valve command accepted");
    if as_json {
        print_json(&json!({ "ok": true, "opening": sent }));
    } else {
        println!("Valve set to {sent}%.");
    }
    Ok(())
}

pub fn check_config(cfg: &tank_config::Config, as_json: bool) {
    let api = ApiCfg::from(&cfg.api);
    let session = SessionCfg::from(cfg);
    let level = cfg.logging.level.as_deref().unwrap_or("warn");
    let file = cfg.logging.file.as_deref();
    let rotation = cfg.logging.rotation.as_deref().unwrap_or("never");
    if as_json {
        print_json(&json!({
            "api": { "base_url": api.base_url, "timeout_ms": cfg.api.timeout_ms },
            "polling": { "status_ms": cfg.polling.status_ms, "history_ms": cfg.polling.history_ms },
            "control": { "quiet_window_ms": cfg.control.quiet_window_ms },
            "logging": { "level": level, "file": file, "rotation": rotation },
        }));
        return;
    }
    println!("Config OK");
    println!("  api.base_url            {}", api.base_url);
    println!("  api.timeout             {:?}", api.timeout);
    println!("  polling.status          {:?}", session.intervals.status);
    println!("  polling.history         {:?}", session.intervals.history);
    println!("  control.quiet_window    {:?}", session.quiet_window);
    println!("  logging.level           {level}");
    println!("  logging.file            {}", file.unwrap_or("-"));
    println!("  logging.rotation        {rotation}");
}
