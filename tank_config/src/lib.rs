#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the tank dashboard client.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; a missing file or an empty document yields
//!   the defaults the dashboard was designed around (200 ms status polling,
//!   5 s history polling, 2 s quiet window after a valve command).
use serde::Deserialize;
use std::path::Path;

/// Default location of the API, matching the control unit's HTTP service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiCfg {
    /// Base URL; endpoint paths (`/status`, `/history`, ...) are appended.
    pub base_url: String,
    /// Per-request timeout applied by the HTTP agent (ms).
    pub timeout_ms: u64,
}

impl Default for ApiCfg {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 1500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingCfg {
    /// Status poll period (ms). Also accepts alias "status_interval_ms".
    #[serde(alias = "status_interval_ms")]
    pub status_ms: u64,
    /// History poll period (ms).
    #[serde(alias = "history_interval_ms")]
    pub history_ms: u64,
}

impl Default for PollingCfg {
    fn default() -> Self {
        Self {
            status_ms: 200,
            history_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlCfg {
    /// After a valve command, server values are not shown for this long (ms).
    pub quiet_window_ms: u64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            quiet_window_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiCfg,
    pub polling: PollingCfg,
    pub control: ControlCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file. A missing file yields `Config::default()`;
/// unreadable or unparsable files are errors.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration in {:?}: {}", path, e))
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const ROTATIONS: [&str; 3] = ["never", "daily", "hourly"];

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Api
        let url = self.api.base_url.trim();
        if url.is_empty() {
            eyre::bail!("api.base_url must not be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            eyre::bail!("api.base_url must start with http:// or https://");
        }
        if self.api.timeout_ms == 0 {
            eyre::bail!("api.timeout_ms must be >= 1");
        }
        if self.api.timeout_ms > 60_000 {
            eyre::bail!("api.timeout_ms is unreasonably large (>60s)");
        }

        // Polling
        if self.polling.status_ms < 10 {
            eyre::bail!("polling.status_ms must be >= 10");
        }
        if self.polling.history_ms < self.polling.status_ms {
            eyre::bail!("polling.history_ms must be >= polling.status_ms");
        }
        if self.polling.history_ms > 60 * 60 * 1000 {
            eyre::bail!("polling.history_ms is unreasonably large (>1h)");
        }

        // Control
        if self.control.quiet_window_ms > 60_000 {
            eyre::bail!("control.quiet_window_ms must be <= 60000");
        }

        // Logging
        if let Some(level) = self.logging.level.as_deref()
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            eyre::bail!("logging.level must be one of {}", LOG_LEVELS.join("|"));
        }
        if let Some(rot) = self.logging.rotation.as_deref()
            && !ROTATIONS.contains(&rot.to_ascii_lowercase().as_str())
        {
            eyre::bail!("logging.rotation must be one of {}", ROTATIONS.join("|"));
        }

        Ok(())
    }
}
