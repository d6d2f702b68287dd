//! Simulated control unit: a tank filled at a constant rate and drained
//! through the valve. Mirrors the control unit's validation rules so the
//! rejection paths can be exercised without hardware.

use crate::error::HttpError;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;
use tank_traits::clock::{Clock, MonotonicClock};
use tank_traits::{ApiResult, DashboardApi, HistoryReading, Mode, ModeCommand, StatusReport};

/// Level above which automatic mode opens the valve halfway (cm).
const L1_CM: f32 = 20.0;
/// Level above which automatic mode opens the valve fully (cm).
const L2_CM: f32 = 40.0;
/// Rain inflow (cm/s).
const INFLOW_CM_S: f32 = 0.8;
/// Drain rate at 100 % opening (cm/s).
const OUTFLOW_CM_S: f32 = 2.0;
const MAX_HISTORY: usize = 100;
/// One history sample is recorded per this many milliseconds of simulated time.
const SAMPLE_EVERY_MS: u64 = 1000;

struct Tank {
    mode: Mode,
    level_cm: f32,
    opening: u8,
    last_step: Instant,
    last_sample: Instant,
    history: VecDeque<HistoryReading>,
    elapsed_ms: u64,
}

pub struct SimulatedApi<C: Clock = MonotonicClock> {
    clock: C,
    tank: Mutex<Tank>,
    /// Epoch milliseconds reported for `elapsed_ms == 0`.
    epoch_ms: u64,
}

impl SimulatedApi<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for SimulatedApi<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SimulatedApi<C> {
    pub fn with_clock(clock: C) -> Self {
        let now = clock.now();
        let epoch_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(0))
            .unwrap_or(0);
        Self {
            clock,
            tank: Mutex::new(Tank {
                mode: Mode::Automatic,
                level_cm: 10.0,
                opening: 0,
                last_step: now,
                last_sample: now,
                history: VecDeque::with_capacity(MAX_HISTORY),
                elapsed_ms: 0,
            }),
            epoch_ms,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tank>, HttpError> {
        self.tank
            .lock()
            .map_err(|_| HttpError::Transport("simulated tank poisoned".to_string()))
    }

    fn advance(&self, tank: &mut Tank) {
        let now = self.clock.now();
        let dt_ms = now.saturating_duration_since(tank.last_step).as_millis();
        let dt_ms = u64::try_from(dt_ms).unwrap_or(u64::MAX);
        tank.last_step = now;
        tank.elapsed_ms = tank.elapsed_ms.saturating_add(dt_ms);

        let dt_s = dt_ms as f32 / 1000.0;
        let drain = OUTFLOW_CM_S * f32::from(tank.opening) / 100.0;
        tank.level_cm = (tank.level_cm + (INFLOW_CM_S - drain) * dt_s).max(0.0);

        if tank.mode == Mode::Automatic {
            tank.opening = if tank.level_cm >= L2_CM {
                100
            } else if tank.level_cm > L1_CM {
                50
            } else {
                0
            };
        }

        if self.clock.ms_since(tank.last_sample) >= SAMPLE_EVERY_MS || tank.history.is_empty() {
            tank.last_sample = now;
            if tank.history.len() == MAX_HISTORY {
                tank.history.pop_front();
            }
            tank.history.push_back(HistoryReading {
                timestamp_ms: self.epoch_ms.saturating_add(tank.elapsed_ms),
                level: tank.level_cm,
            });
        }
    }
}

impl<C: Clock + Send + Sync> DashboardApi for SimulatedApi<C> {
    fn status(&self) -> ApiResult<StatusReport> {
        let mut tank = self.lock()?;
        self.advance(&mut tank);
        Ok(StatusReport {
            mode: tank.mode,
            water_level: tank.level_cm,
            valve_opening: i64::from(tank.opening),
            device_linked: true,
            server_time_ms: Some(self.epoch_ms.saturating_add(tank.elapsed_ms)),
        })
    }

    fn history(&self) -> ApiResult<Vec<HistoryReading>> {
        let mut tank = self.lock()?;
        self.advance(&mut tank);
        Ok(tank.history.iter().copied().collect())
    }

    fn set_mode(&self, mode: ModeCommand) -> ApiResult<()> {
        let mut tank = self.lock()?;
        self.advance(&mut tank);
        tank.mode = mode.into();
        tracing::debug!(mode = mode.as_wire(), "simulated mode change");
        Ok(())
    }

    fn set_valve(&self, opening: u8) -> ApiResult<()> {
        let mut tank = self.lock()?;
        self.advance(&mut tank);
        if opening > 100 {
            return Err(HttpError::Status {
                code: 400,
                message: "Opening must be 0-100".to_string(),
            }
            .into());
        }
        if tank.mode != Mode::Manual {
            return Err(HttpError::Status {
                code: 400,
                message: "Can only set valve in MANUAL mode".to_string(),
            }
            .into());
        }
        tank.opening = opening;
        Ok(())
    }
}
