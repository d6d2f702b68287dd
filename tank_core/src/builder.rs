//! Builder for `SessionRunner`.
//!
//! Collects the API handle, renderer and timing, validates the timing, and
//! spawns the command worker. Polling starts only when the runner runs.

use crate::config::{MAX_QUIET_WINDOW, MIN_STATUS_PERIOD, SessionCfg};
use crate::error::{BuildError, Result};
use crate::poll::SharedApi;
use crate::runner::SessionRunner;
use crate::view::Renderer;
use tank_traits::clock::{Clock, MonotonicClock};

/// Renderer that draws nothing; the default for headless sessions.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn paint(&mut self, _view: &crate::view::DashboardView) -> crate::view::PaintResult {
        Ok(())
    }
}

pub struct SessionBuilder<C: Clock + Clone = MonotonicClock> {
    api: Option<SharedApi>,
    renderer: Option<Box<dyn Renderer>>,
    cfg: SessionCfg,
    clock: C,
}

impl Default for SessionBuilder<MonotonicClock> {
    fn default() -> Self {
        Self {
            api: None,
            renderer: None,
            cfg: SessionCfg::default(),
            clock: MonotonicClock::new(),
        }
    }
}

impl SessionBuilder<MonotonicClock> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock + Clone> SessionBuilder<C> {
    pub fn api(mut self, api: SharedApi) -> Self {
        self.api = Some(api);
        self
    }

    pub fn renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(mut self, cfg: SessionCfg) -> Self {
        self.cfg = cfg;
        self
    }

    /// Swap the clock (tests use a `ManualClock`).
    pub fn clock<C2: Clock + Clone>(self, clock: C2) -> SessionBuilder<C2> {
        SessionBuilder {
            api: self.api,
            renderer: self.renderer,
            cfg: self.cfg,
            clock,
        }
    }

    pub fn build(self) -> Result<SessionRunner<C>> {
        let api = self
            .api
            .ok_or_else(|| eyre::Report::new(BuildError::MissingApi))?;
        validate(&self.cfg).map_err(eyre::Report::new)?;
        let renderer = self.renderer.unwrap_or_else(|| Box::new(NullRenderer));
        Ok(SessionRunner::new(api, renderer, self.cfg, self.clock))
    }
}

fn validate(cfg: &SessionCfg) -> std::result::Result<(), BuildError> {
    if cfg.intervals.status < MIN_STATUS_PERIOD {
        return Err(BuildError::InvalidConfig("status period below 10ms"));
    }
    if cfg.intervals.history < cfg.intervals.status {
        return Err(BuildError::InvalidConfig(
            "history period shorter than status period",
        ));
    }
    if cfg.quiet_window > MAX_QUIET_WINDOW {
        return Err(BuildError::InvalidConfig("quiet window above 60s"));
    }
    if cfg.tick.is_zero() {
        return Err(BuildError::InvalidConfig("tick must be non-zero"));
    }
    Ok(())
}
