//! Last-known server state.
//!
//! Snapshots and history series are replaced wholesale, never merged. A
//! response that completes late simply overwrites a newer one; at the poll
//! rates involved this is an accepted inconsistency.

use crate::util::{clamp_opening, sanitize_level};
use std::time::Instant;
use tank_traits::{HistoryReading, Mode, StatusReport};

/// One point-in-time device status as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub mode: Mode,
    /// Water level in cm, never negative.
    pub water_level: f32,
    /// Valve opening in percent, `[0, 100]`.
    pub valve_opening: u8,
    /// Whether the server still hears from the level sensor unit.
    pub device_linked: bool,
    pub server_time_ms: Option<u64>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            mode: Mode::Unconnected,
            water_level: 0.0,
            valve_opening: 0,
            device_linked: false,
            server_time_ms: None,
        }
    }
}

impl From<&StatusReport> for Snapshot {
    fn from(r: &StatusReport) -> Self {
        Self {
            mode: r.mode,
            water_level: sanitize_level(r.water_level),
            valve_opening: clamp_opening(r.valve_opening),
            device_linked: r.device_linked,
            server_time_ms: r.server_time_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    pub timestamp_ms: u64,
    pub level: f32,
}

impl From<&HistoryReading> for HistoryPoint {
    fn from(r: &HistoryReading) -> Self {
        Self {
            timestamp_ms: r.timestamp_ms,
            level: sanitize_level(r.level),
        }
    }
}

#[derive(Debug, Default)]
pub struct RemoteStateCache {
    snapshot: Snapshot,
    history: Vec<HistoryPoint>,
    server_reachable: bool,
    last_update: Option<Instant>,
    /// Set while status polls are failing; used to log an outage once.
    outage: bool,
}

impl RemoteStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached snapshot. Returns the previous one.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot, now: Instant) -> Snapshot {
        let previous = std::mem::replace(&mut self.snapshot, snapshot);
        self.server_reachable = true;
        self.last_update = Some(now);
        if self.outage {
            self.outage = false;
            tracing::info!(mode = %snapshot.mode, "status polling recovered");
        }
        previous
    }

    /// Replace the history series. An empty series is ignored (returns false)
    /// so "no data yet" never wipes a good chart.
    pub fn apply_history(&mut self, points: Vec<HistoryPoint>) -> bool {
        if points.is_empty() {
            return false;
        }
        self.history = points;
        true
    }

    /// Record a failed status poll: numeric fields stay readable, mode becomes
    /// `NotAvailable`, the device link is reported down. Returns true on the
    /// first failure of an outage.
    pub fn mark_unavailable(&mut self) -> bool {
        self.snapshot.mode = Mode::NotAvailable;
        self.snapshot.device_linked = false;
        self.server_reachable = false;
        !std::mem::replace(&mut self.outage, true)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn history(&self) -> &[HistoryPoint] {
        &self.history
    }

    pub fn server_reachable(&self) -> bool {
        self.server_reachable
    }

    /// Instant of the last successful status poll.
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }
}
