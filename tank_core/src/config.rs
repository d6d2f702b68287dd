//! Runtime configuration for a dashboard session.
//!
//! These are the structs the session and its workers use. They are separate
//! from the TOML-deserialized config in `tank_config`; see `conversions`.

use crate::edit::DEFAULT_QUIET_WINDOW;
use crate::poll::PollIntervals;
use std::time::Duration;

/// Lower bound for the status period; faster polling only adds load.
pub const MIN_STATUS_PERIOD: Duration = Duration::from_millis(10);
/// Upper bound for the quiet window after a valve command.
pub const MAX_QUIET_WINDOW: Duration = Duration::from_secs(60);

/// How to reach the dashboard API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCfg {
    pub base_url: String,
    /// Per-request agent timeout.
    pub timeout: Duration,
}

impl Default for ApiCfg {
    fn default() -> Self {
        Self {
            base_url: tank_config::DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_millis(1500),
        }
    }
}

/// Timing of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCfg {
    pub intervals: PollIntervals,
    /// Server values are held back this long after a valve commit.
    pub quiet_window: Duration,
    /// Repaint period when no events arrive.
    pub tick: Duration,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            intervals: PollIntervals::default(),
            quiet_window: DEFAULT_QUIET_WINDOW,
            tick: Duration::from_secs(1),
        }
    }
}
