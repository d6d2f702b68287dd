//! Single-threaded session state: cache, mode, slider and operator notices.
//!
//! `Session::handle` consumes one `SessionEvent` and returns the side effects
//! the runner must perform. It never blocks and never talks to the network,
//! so every reconciliation scenario can be driven from a test with a manual
//! clock.

use crate::cache::{HistoryPoint, RemoteStateCache, Snapshot};
use crate::command::Command;
use crate::edit::EditableValueController;
use crate::error::ApiError;
use crate::mode::{ModeChange, ModeController};
use crate::view::{DashboardView, ManualControls};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tank_traits::clock::{Clock, MonotonicClock};
use tank_traits::{HistoryReading, Mode, StatusReport};

/// Oldest notices are dropped beyond this many.
pub const MAX_NOTICES: usize = 8;
/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

const MANUAL_ONLY: &str = "Valve can only be set in MANUAL mode.";

/// Operator input, already parsed by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Edit(i64),
    InteractionStart,
    InteractionEnd,
    Commit,
    RequestMode(Mode),
    Quit,
}

#[derive(Debug)]
pub enum SessionEvent {
    Status(Result<StatusReport, ApiError>),
    History(Result<Vec<HistoryReading>, ApiError>),
    Intent(Intent),
    CommandDone {
        command: Command,
        result: Result<(), ApiError>,
    },
    /// Periodic wake-up so time-based display (update age, notice expiry) moves.
    Tick,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: Instant,
}

/// Side effect requested by `Session::handle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Dispatch(Command),
    /// Poll status now instead of waiting for the next tick.
    RefreshStatus,
    Repaint,
    Stop,
}

#[derive(Debug)]
pub struct Session<C: Clock + Clone = MonotonicClock> {
    cache: RemoteStateCache,
    mode: ModeController,
    edit: EditableValueController<C>,
    notices: VecDeque<Notice>,
    clock: C,
    stopping: bool,
}

impl Session<MonotonicClock> {
    pub fn new(quiet_window: Duration) -> Self {
        Self::with_clock(MonotonicClock::new(), quiet_window)
    }
}

impl<C: Clock + Clone> Session<C> {
    pub fn with_clock(clock: C, quiet_window: Duration) -> Self {
        Self {
            cache: RemoteStateCache::new(),
            mode: ModeController::new(),
            edit: EditableValueController::with_clock(clock.clone(), quiet_window),
            notices: VecDeque::with_capacity(MAX_NOTICES),
            clock,
            stopping: false,
        }
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<Action> {
        match event {
            SessionEvent::Status(Ok(report)) => self.on_status(&report),
            SessionEvent::Status(Err(e)) => self.on_status_failed(&e),
            SessionEvent::History(Ok(readings)) => {
                let points = readings.iter().map(HistoryPoint::from).collect();
                if self.cache.apply_history(points) {
                    vec![Action::Repaint]
                } else {
                    Vec::new()
                }
            }
            SessionEvent::History(Err(e)) => {
                // The chart keeps its last series.
                tracing::warn!(error = %e, "history poll failed");
                Vec::new()
            }
            SessionEvent::Intent(intent) => self.on_intent(intent),
            SessionEvent::CommandDone { command, result } => self.on_command_done(command, result),
            SessionEvent::Tick => {
                self.expire_notices();
                vec![Action::Repaint]
            }
            SessionEvent::Shutdown => {
                self.stopping = true;
                vec![Action::Stop]
            }
        }
    }

    fn on_status(&mut self, report: &StatusReport) -> Vec<Action> {
        let snapshot = Snapshot::from(report);
        self.cache.apply_snapshot(snapshot, self.clock.now());
        self.follow_mode(snapshot.mode);
        if self.mode.current().is_manual() {
            self.edit.reconcile(i64::from(snapshot.valve_opening));
        }
        vec![Action::Repaint]
    }

    fn on_status_failed(&mut self, e: &ApiError) -> Vec<Action> {
        if self.cache.mark_unavailable() {
            tracing::warn!(error = %e, "status poll failed, server unavailable");
        } else {
            tracing::debug!(error = %e, "status poll still failing");
        }
        self.follow_mode(Mode::NotAvailable);
        vec![Action::Repaint]
    }

    fn follow_mode(&mut self, mode: Mode) {
        let change = self.mode.apply(mode);
        if change.crosses_manual() {
            self.edit.reset_for_mode_switch();
        }
        if let ModeChange::Changed { to: Mode::Manual, .. } = change {
            tracing::debug!(
                opening = self.cache.snapshot().valve_opening,
                "manual controls enabled"
            );
        }
    }

    fn on_intent(&mut self, intent: Intent) -> Vec<Action> {
        let manual = self.mode.manual_controls_visible();
        match intent {
            Intent::Edit(v) if manual => {
                self.edit.on_user_edit(v);
                vec![Action::Repaint]
            }
            Intent::InteractionStart if manual => {
                self.edit.on_interaction_start();
                vec![Action::Repaint]
            }
            // Releasing is always allowed so a gesture cannot outlive MANUAL.
            Intent::InteractionEnd => {
                self.edit.on_interaction_end();
                vec![Action::Repaint]
            }
            Intent::Commit if manual => {
                let ticket = self.edit.commit();
                vec![
                    Action::Dispatch(Command::SetValve(ticket)),
                    Action::Repaint,
                ]
            }
            Intent::Edit(_) | Intent::InteractionStart | Intent::Commit => {
                tracing::debug!(?intent, mode = %self.mode.current(), "manual intent ignored");
                self.notify(NoticeLevel::Info, MANUAL_ONLY.to_owned());
                vec![Action::Repaint]
            }
            Intent::RequestMode(target) => match self.mode.request_mode(target) {
                Ok(cmd) => {
                    tracing::info!(mode = cmd.as_wire(), "mode change requested");
                    vec![Action::Dispatch(Command::SetMode(cmd))]
                }
                Err(e) => {
                    self.notify(NoticeLevel::Error, e.to_string());
                    vec![Action::Repaint]
                }
            },
            Intent::Quit => {
                self.stopping = true;
                vec![Action::Stop]
            }
        }
    }

    fn on_command_done(&mut self, command: Command, result: Result<(), ApiError>) -> Vec<Action> {
        match (command, result) {
            (Command::SetValve(ticket), Ok(())) => {
                self.edit.commit_succeeded(ticket);
                vec![Action::RefreshStatus, Action::Repaint]
            }
            // The new mode becomes visible with the next snapshot.
            (Command::SetMode(_), Ok(())) => vec![Action::RefreshStatus, Action::Repaint],
            (command, Err(e)) => {
                match command {
                    Command::SetValve(ticket) => self.edit.commit_failed(ticket),
                    Command::SetMode(cmd) => self.mode.request_failed(cmd),
                }
                let message = match e {
                    ApiError::Rejected { message, .. } => message,
                    ApiError::Transport(_) | ApiError::Malformed(_) => {
                        command.transport_hint().to_owned()
                    }
                };
                self.notify(NoticeLevel::Error, message);
                vec![Action::Repaint]
            }
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            level,
            message,
            raised_at: self.clock.now(),
        });
    }

    fn expire_notices(&mut self) {
        let now = self.clock.now();
        self.notices
            .retain(|n| now.saturating_duration_since(n.raised_at) <= NOTICE_TTL);
    }

    /// Snapshot of everything the renderer shows.
    pub fn view(&self) -> DashboardView {
        let snapshot = self.cache.snapshot();
        let now = self.clock.now();
        DashboardView {
            mode: self.mode.current(),
            water_level: snapshot.water_level,
            valve_opening: snapshot.valve_opening,
            device_linked: snapshot.device_linked,
            server_reachable: self.cache.server_reachable(),
            server_time_ms: snapshot.server_time_ms,
            last_update_age: self
                .cache
                .last_update()
                .map(|t| now.saturating_duration_since(t)),
            history: self.cache.history().to_vec(),
            manual: self
                .mode
                .manual_controls_visible()
                .then(|| ManualControls {
                    displayed: self.edit.displayed(),
                    dirty: self.edit.is_dirty(),
                    phase: self.edit.phase(),
                }),
            info_message: self.mode.info_message(),
            notices: self.notices.iter().cloned().collect(),
        }
    }

    pub fn cache(&self) -> &RemoteStateCache {
        &self.cache
    }

    pub fn mode(&self) -> Mode {
        self.mode.current()
    }

    pub fn edit(&self) -> &EditableValueController<C> {
        &self.edit
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }
}
