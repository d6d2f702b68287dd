//! Test and helper doubles for tank_core.

use crate::error::ApiError;
use crate::view::{DashboardView, PaintResult, Renderer};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tank_traits::{ApiResult, DashboardApi, HistoryReading, Mode, ModeCommand, StatusReport};

/// A command as the API received it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Mode(ModeCommand),
    Valve(u8),
}

#[derive(Debug)]
struct Script {
    status: Result<StatusReport, ApiError>,
    history: Result<Vec<HistoryReading>, ApiError>,
    /// Outcomes for the next commands; empty means success.
    outcomes: VecDeque<Result<(), ApiError>>,
    recorded: Vec<Recorded>,
    /// Latency of every `status()` call.
    status_delay: Duration,
}

/// `DashboardApi` that answers from a script and records commands.
///
/// Status and history keep returning the last value set; command outcomes
/// are consumed in order.
#[derive(Debug, Clone)]
pub struct ScriptedApi {
    script: Arc<Mutex<Script>>,
    status_calls: Arc<AtomicUsize>,
    history_calls: Arc<AtomicUsize>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedApi {
    /// Starts AUTOMATIC, level 0, valve 0, device linked, no history.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                status: Ok(status_report(Mode::Automatic, 0.0, 0)),
                history: Ok(Vec::new()),
                outcomes: VecDeque::new(),
                recorded: Vec::new(),
                status_delay: Duration::ZERO,
            })),
            status_calls: Arc::new(AtomicUsize::new(0)),
            history_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        // A poisoned lock only happens after a test already panicked.
        let mut guard = match self.script.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    pub fn set_status(&self, status: Result<StatusReport, ApiError>) {
        self.with_script(|s| s.status = status);
    }

    pub fn set_history(&self, history: Result<Vec<HistoryReading>, ApiError>) {
        self.with_script(|s| s.history = history);
    }

    /// Make every status call take `delay`, like a slow server.
    pub fn set_status_delay(&self, delay: Duration) {
        self.with_script(|s| s.status_delay = delay);
    }

    /// Queue the outcome of the next command.
    pub fn push_outcome(&self, outcome: Result<(), ApiError>) {
        self.with_script(|s| s.outcomes.push_back(outcome));
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.with_script(|s| s.recorded.clone())
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::Relaxed)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::Relaxed)
    }

    fn command(&self, cmd: Recorded) -> ApiResult<()> {
        self.with_script(|s| {
            s.recorded.push(cmd);
            s.outcomes.pop_front().unwrap_or(Ok(()))
        })
        .map_err(Into::into)
    }
}

impl DashboardApi for ScriptedApi {
    fn status(&self) -> ApiResult<StatusReport> {
        self.status_calls.fetch_add(1, Ordering::Relaxed);
        let (status, delay) = self.with_script(|s| (s.status.clone(), s.status_delay));
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        status.map_err(Into::into)
    }

    fn history(&self) -> ApiResult<Vec<HistoryReading>> {
        self.history_calls.fetch_add(1, Ordering::Relaxed);
        self.with_script(|s| s.history.clone()).map_err(Into::into)
    }

    fn set_mode(&self, mode: ModeCommand) -> ApiResult<()> {
        self.command(Recorded::Mode(mode))
    }

    fn set_valve(&self, opening: u8) -> ApiResult<()> {
        self.command(Recorded::Valve(opening))
    }
}

/// Shorthand for a linked status report.
pub fn status_report(mode: Mode, water_level: f32, valve_opening: i64) -> StatusReport {
    StatusReport {
        mode,
        water_level,
        valve_opening,
        device_linked: true,
        server_time_ms: None,
    }
}

/// Renderer that keeps every frame it is given.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    frames: Arc<Mutex<Vec<DashboardView>>>,
    fail_init: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer whose `init` fails, as a terminal that cannot be opened would.
    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    pub fn frames(&self) -> Vec<DashboardView> {
        match self.frames.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<DashboardView> {
        self.frames().pop()
    }
}

impl Renderer for RecordingRenderer {
    fn init(&mut self) -> PaintResult {
        if self.fail_init {
            return Err("no terminal".into());
        }
        Ok(())
    }

    fn paint(&mut self, view: &DashboardView) -> PaintResult {
        if let Ok(mut g) = self.frames.lock() {
            g.push(view.clone());
        }
        Ok(())
    }
}
