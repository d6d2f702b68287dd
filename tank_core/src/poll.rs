//! Background polling of the dashboard API.
//!
//! `PollClock` runs two independent obligations, status and history, each on
//! its own thread. Both fire once immediately on `start()` and then at a
//! fixed rate, whatever the fetch latency; outcomes are sent into the session's event channel. The threads
//! never touch session state.
//!
//! Safety: every worker thread is signalled and joined by `stop()`, which is
//! idempotent and also runs on drop, so no polling outlives its `PollClock`.
use crate::api_error::map_result;
use crate::session::SessionEvent;
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tank_traits::DashboardApi;

/// Shared handle to the API used by pollers and the command worker.
pub type SharedApi = Arc<dyn DashboardApi + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollKind {
    Status,
    History,
}

/// Poll periods for the two obligations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub status: Duration,
    pub history: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            status: Duration::from_millis(200),
            history: Duration::from_millis(5000),
        }
    }
}

/// Next fetch instant on the fixed-rate grid `start + k * period`.
///
/// A deadline not yet reached (an early wake) is kept. Deadlines that passed
/// while a fetch was running are skipped, not queued.
pub(crate) fn next_deadline(next: Instant, now: Instant, period: Duration) -> Instant {
    if period.is_zero() {
        return now;
    }
    let mut next = next;
    while next <= now {
        next += period;
    }
    next
}

enum Signal {
    /// Poll now instead of waiting for the next period.
    Wake,
    Stop,
}

struct PollWorker {
    kind: PollKind,
    ctrl: xch::Sender<Signal>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl PollWorker {
    fn spawn(
        kind: PollKind,
        period: Duration,
        api: SharedApi,
        events: xch::Sender<SessionEvent>,
    ) -> Self {
        let (ctrl, ctrl_rx) = xch::unbounded::<Signal>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            let mut next = Instant::now();
            loop {
                // Immediate shutdown check (lock-free atomic)
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!(?kind, "poller received shutdown signal");
                    break;
                }

                let event = match kind {
                    PollKind::Status => SessionEvent::Status(map_result(api.status())),
                    PollKind::History => SessionEvent::History(map_result(api.history())),
                };

                // A fetch that completes after stop() is dropped, not delivered.
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                // If send fails, the session is gone; exit gracefully
                if events.send(event).is_err() {
                    tracing::debug!(?kind, "session disconnected, exiting poller");
                    break;
                }

                next = next_deadline(next, Instant::now(), period);
                match ctrl_rx.recv_deadline(next) {
                    Ok(Signal::Wake) | Err(xch::RecvTimeoutError::Timeout) => {
                        // Coalesce wakes that piled up during the fetch.
                        while let Ok(sig) = ctrl_rx.try_recv() {
                            if matches!(sig, Signal::Stop) {
                                return;
                            }
                        }
                    }
                    Ok(Signal::Stop) | Err(xch::RecvTimeoutError::Disconnected) => break,
                }
            }
            tracing::trace!(?kind, "poller thread exiting cleanly");
        });

        Self {
            kind,
            ctrl,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    fn signal_stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.ctrl.send(Signal::Stop);
    }

    /// The thread exits after its current fetch, bounded by the agent timeout.
    fn join(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!(kind = ?self.kind, "poller joined"),
                Err(e) => tracing::warn!(?e, kind = ?self.kind, "poller panicked during shutdown"),
            }
        }
    }
}

/// Two repeating poll obligations with explicit cancel handles.
pub struct PollClock {
    intervals: PollIntervals,
    workers: Vec<PollWorker>,
}

impl PollClock {
    pub fn new(intervals: PollIntervals) -> Self {
        Self {
            intervals,
            workers: Vec::with_capacity(2),
        }
    }

    pub fn intervals(&self) -> PollIntervals {
        self.intervals
    }

    /// Start both pollers; each fires immediately. No-op if already running.
    pub fn start(&mut self, api: SharedApi, events: xch::Sender<SessionEvent>) {
        if self.is_running() {
            return;
        }
        tracing::info!(
            status_ms = crate::util::millis(self.intervals.status),
            history_ms = crate::util::millis(self.intervals.history),
            "polling started"
        );
        self.workers.push(PollWorker::spawn(
            PollKind::Status,
            self.intervals.status,
            api.clone(),
            events.clone(),
        ));
        self.workers.push(PollWorker::spawn(
            PollKind::History,
            self.intervals.history,
            api,
            events,
        ));
    }

    /// Ask one poller to fetch now (e.g. right after a command succeeded).
    pub fn trigger(&self, kind: PollKind) {
        if let Some(w) = self.workers.iter().find(|w| w.kind == kind) {
            let _ = w.ctrl.send(Signal::Wake);
        }
    }

    /// Cancel both pollers and wait for their threads. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        for w in &self.workers {
            w.signal_stop();
        }
        for w in &mut self.workers {
            w.join();
        }
        self.workers.clear();
        tracing::info!("polling stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }
}

impl Drop for PollClock {
    fn drop(&mut self) {
        self.stop();
    }
}
