//! Event loop that ties the session to its threads and its renderer.
//!
//! The runner owns the only copy of `Session`. Poll threads, the command
//! worker and front ends (stdin reader, Ctrl-C handler) talk to it through
//! one channel of `SessionEvent`s; actions returned by the session are
//! carried out here, on the session thread.

use crate::command::{Command, CommandWorker};
use crate::config::SessionCfg;
use crate::error::{ApiError, Result, SessionError};
use crate::poll::{PollClock, PollKind, SharedApi};
use crate::session::{Action, Intent, Session, SessionEvent};
use crate::view::Renderer;
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tank_traits::clock::{Clock, MonotonicClock};

/// Cloneable handle for feeding a running session from other threads.
#[derive(Clone)]
pub struct SessionHandle {
    events: xch::Sender<SessionEvent>,
    shutdown: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn send(&self, intent: Intent) -> std::result::Result<(), SessionError> {
        self.events
            .send(SessionEvent::Intent(intent))
            .map_err(|_| SessionError::ChannelClosed)
    }

    /// Ask the loop to stop. Safe from a signal handler thread.
    pub fn request_stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Wake the loop if it is waiting; a closed channel means it already exited.
        let _ = self.events.send(SessionEvent::Shutdown);
    }

    pub fn is_stopping(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

pub struct SessionRunner<C: Clock + Clone = MonotonicClock> {
    session: Session<C>,
    renderer: Box<dyn Renderer>,
    api: SharedApi,
    poll: PollClock,
    commands: CommandWorker,
    events_tx: xch::Sender<SessionEvent>,
    events_rx: xch::Receiver<SessionEvent>,
    shutdown: Arc<AtomicBool>,
    tick: Duration,
    paint_failing: bool,
}

impl<C: Clock + Clone> SessionRunner<C> {
    pub(crate) fn new(
        api: SharedApi,
        renderer: Box<dyn Renderer>,
        cfg: SessionCfg,
        clock: C,
    ) -> Self {
        let (events_tx, events_rx) = xch::unbounded();
        let commands = CommandWorker::spawn(api.clone(), events_tx.clone());
        Self {
            session: Session::with_clock(clock, cfg.quiet_window),
            renderer,
            api,
            poll: PollClock::new(cfg.intervals),
            commands,
            events_tx,
            events_rx,
            shutdown: Arc::new(AtomicBool::new(false)),
            tick: cfg.tick,
            paint_failing: false,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            events: self.events_tx.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    /// Initialize the renderer, start polling, and process events until quit,
    /// a stop request, or Ctrl-C. Polling is stopped before returning.
    pub fn run(&mut self) -> Result<()> {
        self.renderer
            .init()
            .map_err(|e| eyre::Report::new(SessionError::RendererInit(e.to_string())))?;
        self.poll.start(self.api.clone(), self.events_tx.clone());
        self.paint();

        // Ticks run on their own deadline; a busy channel must not starve them.
        let mut next_tick = Instant::now() + self.tick;
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("stop requested");
                break;
            }
            match self.events_rx.recv_deadline(next_tick) {
                Ok(event) => {
                    if !self.step(event) {
                        break;
                    }
                }
                Err(xch::RecvTimeoutError::Timeout) => {}
                Err(xch::RecvTimeoutError::Disconnected) => break,
            }
            let now = Instant::now();
            if now >= next_tick {
                next_tick = now + self.tick;
                if !self.step(SessionEvent::Tick) {
                    break;
                }
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Handle one event and perform its actions. Returns false once the
    /// session asked to stop.
    pub fn step(&mut self, event: SessionEvent) -> bool {
        let mut keep_going = true;
        let mut repaint = false;
        for action in self.session.handle(event) {
            match action {
                Action::Dispatch(command) => self.dispatch(command),
                Action::RefreshStatus => self.poll.trigger(PollKind::Status),
                Action::Repaint => repaint = true,
                Action::Stop => keep_going = false,
            }
        }
        if repaint {
            self.paint();
        }
        keep_going
    }

    /// Wait up to `timeout` for one queued event and handle it. Returns
    /// false if nothing arrived.
    pub fn pump(&mut self, timeout: Duration) -> bool {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.step(event);
                true
            }
            Err(_) => false,
        }
    }

    fn dispatch(&mut self, command: Command) {
        if !self.commands.submit(command) {
            tracing::error!(?command, "command worker is gone");
            let _ = self.events_tx.send(SessionEvent::CommandDone {
                command,
                result: Err(ApiError::Transport("command worker stopped".into())),
            });
        }
    }

    fn paint(&mut self) {
        match self.renderer.paint(&self.session.view()) {
            Ok(()) => self.paint_failing = false,
            Err(e) if !self.paint_failing => {
                self.paint_failing = true;
                tracing::warn!(error = %e, "paint failed");
            }
            Err(e) => tracing::debug!(error = %e, "paint still failing"),
        }
    }

    /// Stop polling and drain the command worker. Idempotent.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.poll.stop();
        self.commands.shutdown();
    }
}

impl<C: Clock + Clone> Drop for SessionRunner<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
