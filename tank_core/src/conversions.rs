//! `From` implementations bridging `tank_config` types to `tank_core` types.

use crate::config::{ApiCfg, SessionCfg};
use crate::poll::PollIntervals;
use std::time::Duration;

// ── ApiCfg ───────────────────────────────────────────────────────────────────

impl From<&tank_config::ApiCfg> for ApiCfg {
    fn from(c: &tank_config::ApiCfg) -> Self {
        Self {
            base_url: c.base_url.clone(),
            timeout: Duration::from_millis(c.timeout_ms),
        }
    }
}

// ── PollIntervals ────────────────────────────────────────────────────────────

impl From<&tank_config::PollingCfg> for PollIntervals {
    fn from(c: &tank_config::PollingCfg) -> Self {
        Self {
            status: Duration::from_millis(c.status_ms),
            history: Duration::from_millis(c.history_ms),
        }
    }
}

// ── SessionCfg ───────────────────────────────────────────────────────────────

impl From<&tank_config::Config> for SessionCfg {
    fn from(c: &tank_config::Config) -> Self {
        Self {
            intervals: PollIntervals::from(&c.polling),
            quiet_window: Duration::from_millis(c.control.quiet_window_ms),
            ..Self::default()
        }
    }
}
