pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::fmt;

/// Error type used at the transport boundary. Implementations return their own
/// error types boxed; `tank_core` maps them to a typed taxonomy.
pub type ApiResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Operating mode of the regulation device as seen by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// No successful poll yet, or the server lost its link to the device.
    #[default]
    Unconnected,
    Automatic,
    Manual,
    /// Client-side only: the last status poll failed.
    NotAvailable,
}

impl Mode {
    /// Parse a mode reported by the server. `NotAvailable` is never accepted
    /// from the wire.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNCONNECTED" => Some(Self::Unconnected),
            "AUTOMATIC" => Some(Self::Automatic),
            "MANUAL" => Some(Self::Manual),
            _ => None,
        }
    }

    /// Human-facing badge text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unconnected => "UNCONNECTED",
            Self::Automatic => "AUTOMATIC",
            Self::Manual => "MANUAL",
            Self::NotAvailable => "NOT AVAILABLE",
        }
    }

    #[inline]
    pub fn is_manual(self) -> bool {
        matches!(self, Self::Manual)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The only modes an operator may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeCommand {
    Automatic,
    Manual,
}

impl ModeCommand {
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Automatic => "AUTOMATIC",
            Self::Manual => "MANUAL",
        }
    }
}

impl From<ModeCommand> for Mode {
    fn from(c: ModeCommand) -> Self {
        match c {
            ModeCommand::Automatic => Mode::Automatic,
            ModeCommand::Manual => Mode::Manual,
        }
    }
}

impl TryFrom<Mode> for ModeCommand {
    type Error = Mode;
    fn try_from(m: Mode) -> Result<Self, Self::Error> {
        match m {
            Mode::Automatic => Ok(Self::Automatic),
            Mode::Manual => Ok(Self::Manual),
            other => Err(other),
        }
    }
}

/// One decoded `/status` response. Numeric fields are passed through as
/// received; range checks happen in the core.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub mode: Mode,
    pub water_level: f32,
    pub valve_opening: i64,
    pub device_linked: bool,
    /// Server-side epoch milliseconds, when the server sends one.
    pub server_time_ms: Option<u64>,
}

/// One entry of the `/history` series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryReading {
    pub timestamp_ms: u64,
    pub level: f32,
}

/// Remote dashboard endpoint. Implementations must be shareable across the
/// polling threads.
pub trait DashboardApi {
    fn status(&self) -> ApiResult<StatusReport>;
    fn history(&self) -> ApiResult<Vec<HistoryReading>>;
    fn set_mode(&self, mode: ModeCommand) -> ApiResult<()>;
    fn set_valve(&self, opening: u8) -> ApiResult<()>;
}

impl<T: DashboardApi + ?Sized> DashboardApi for std::sync::Arc<T> {
    fn status(&self) -> ApiResult<StatusReport> {
        (**self).status()
    }
    fn history(&self) -> ApiResult<Vec<HistoryReading>> {
        (**self).history()
    }
    fn set_mode(&self, mode: ModeCommand) -> ApiResult<()> {
        (**self).set_mode(mode)
    }
    fn set_valve(&self, opening: u8) -> ApiResult<()> {
        (**self).set_valve(opening)
    }
}
