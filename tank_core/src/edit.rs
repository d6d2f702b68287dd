//! Reconciliation of the locally edited valve opening against polled server values.
//!
//! `EditState` is a plain value and `EditState::step` is the whole transition
//! table: every input (user edit, gesture start/end, commit and its outcome,
//! server value, mode switch) goes through it. `EditableValueController` is
//! the imperative wrapper that supplies the clock.
//!
//! A server value overwrites the displayed one only when all of these hold:
//! - no gesture is in progress (`interacting == false`)
//! - the displayed value has no uncommitted edit (`dirty == false`)
//! - no valve command is in flight
//! - more than the quiet window has passed since the last commit
//!
//! The quiet window hides the round trip between sending a command and the
//! server reporting the new opening in its next snapshot.

use crate::util::clamp_opening;
use std::time::{Duration, Instant};
use tank_traits::clock::{Clock, MonotonicClock};

/// Default suppression window after a commit.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(2000);

/// Identifies one commit so late outcomes of superseded commits are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitTicket {
    pub seq: u64,
    pub value: u8,
}

/// A commit whose command has not completed. Remembers what to restore if
/// the server rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub ticket: CommitTicket,
    prior_dirty: bool,
    prior_last_commit: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditState {
    /// Value shown on the slider, `[0, 100]`.
    pub displayed: u8,
    /// Changed locally since the last commit or mode switch.
    pub dirty: bool,
    /// A pointer/touch gesture is in progress.
    pub interacting: bool,
    pub last_commit: Option<Instant>,
    pub in_flight: Option<InFlight>,
    commits: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    UserEdit(i64),
    InteractionStart,
    InteractionEnd,
    Commit,
    CommitAccepted(CommitTicket),
    CommitRejected(CommitTicket),
    ServerValue(i64),
    ModeSwitched,
}

/// Why a server value was not shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    Interacting,
    Dirty,
    CommitInFlight,
    QuietWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEffect {
    Nothing,
    /// Send this opening to the server.
    Send(CommitTicket),
    /// The displayed value was replaced by the server's.
    Overwritten { previous: u8 },
    Held(HoldReason),
}

/// Named view of the flag combination, for display and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    /// Tracking the server.
    Idle,
    /// Uncommitted local edit.
    Editing,
    /// Gesture in progress.
    Interacting,
    /// Command sent, no answer yet.
    Committing,
    /// Command accepted, waiting out the quiet window.
    AwaitingConfirm,
}

impl EditState {
    pub fn new(displayed: u8) -> Self {
        Self {
            displayed: displayed.min(100),
            ..Self::default()
        }
    }

    fn within_window(&self, now: Instant, window: Duration) -> bool {
        self.last_commit
            .is_some_and(|t| now.saturating_duration_since(t) <= window)
    }

    /// Why a server value would be held back right now, if at all.
    pub fn hold_reason(&self, now: Instant, window: Duration) -> Option<HoldReason> {
        if self.interacting {
            Some(HoldReason::Interacting)
        } else if self.dirty {
            Some(HoldReason::Dirty)
        } else if self.in_flight.is_some() {
            Some(HoldReason::CommitInFlight)
        } else if self.within_window(now, window) {
            Some(HoldReason::QuietWindow)
        } else {
            None
        }
    }

    pub fn phase(&self, now: Instant, window: Duration) -> EditPhase {
        match self.hold_reason(now, window) {
            Some(HoldReason::Interacting) => EditPhase::Interacting,
            Some(HoldReason::Dirty) => EditPhase::Editing,
            Some(HoldReason::CommitInFlight) => EditPhase::Committing,
            Some(HoldReason::QuietWindow) => EditPhase::AwaitingConfirm,
            None => EditPhase::Idle,
        }
    }

    /// Start a commit of the displayed value and return its ticket. This is
    /// the `Commit` transition of `step`.
    pub fn begin_commit(&mut self, now: Instant) -> CommitTicket {
        self.commits = self.commits.wrapping_add(1);
        let ticket = CommitTicket {
            seq: self.commits,
            value: self.displayed,
        };
        // A superseded in-flight commit keeps its own restore point.
        let (prior_dirty, prior_last_commit) = match self.in_flight {
            Some(f) => (f.prior_dirty || self.dirty, f.prior_last_commit),
            None => (self.dirty, self.last_commit),
        };
        self.in_flight = Some(InFlight {
            ticket,
            prior_dirty,
            prior_last_commit,
        });
        self.dirty = false;
        self.last_commit = Some(now);
        ticket
    }

    /// Apply one event. Pure: the caller supplies the time.
    pub fn step(mut self, event: EditEvent, now: Instant, window: Duration) -> (Self, EditEffect) {
        let effect = match event {
            EditEvent::UserEdit(v) => {
                self.displayed = clamp_opening(v);
                self.dirty = true;
                EditEffect::Nothing
            }
            EditEvent::InteractionStart => {
                self.interacting = true;
                EditEffect::Nothing
            }
            EditEvent::InteractionEnd => {
                self.interacting = false;
                EditEffect::Nothing
            }
            EditEvent::Commit => EditEffect::Send(self.begin_commit(now)),
            EditEvent::CommitAccepted(ticket) => {
                if self.in_flight.is_some_and(|f| f.ticket == ticket) {
                    self.in_flight = None;
                    // A successful commit also releases a gesture whose end was missed.
                    self.interacting = false;
                }
                EditEffect::Nothing
            }
            EditEvent::CommitRejected(ticket) => {
                if let Some(f) = self.in_flight
                    && f.ticket == ticket
                {
                    self.in_flight = None;
                    // Edits made while the command was in flight stay dirty.
                    self.dirty = self.dirty || f.prior_dirty;
                    self.last_commit = f.prior_last_commit;
                }
                EditEffect::Nothing
            }
            EditEvent::ServerValue(v) => match self.hold_reason(now, window) {
                Some(reason) => EditEffect::Held(reason),
                None => {
                    let server = clamp_opening(v);
                    if server == self.displayed {
                        EditEffect::Nothing
                    } else {
                        let previous = std::mem::replace(&mut self.displayed, server);
                        EditEffect::Overwritten { previous }
                    }
                }
            },
            EditEvent::ModeSwitched => {
                self.dirty = false;
                self.interacting = false;
                // Outcomes of commits from the previous session are ignored.
                self.in_flight = None;
                EditEffect::Nothing
            }
        };
        (self, effect)
    }
}

/// Owns the edit state for one session and feeds it the clock.
#[derive(Debug)]
pub struct EditableValueController<C: Clock = MonotonicClock> {
    state: EditState,
    clock: C,
    quiet_window: Duration,
}

impl EditableValueController<MonotonicClock> {
    pub fn new(quiet_window: Duration) -> Self {
        Self::with_clock(MonotonicClock::new(), quiet_window)
    }
}

impl<C: Clock> EditableValueController<C> {
    pub fn with_clock(clock: C, quiet_window: Duration) -> Self {
        Self {
            state: EditState::default(),
            clock,
            quiet_window,
        }
    }

    fn apply(&mut self, event: EditEvent) -> EditEffect {
        let now = self.clock.now();
        let (next, effect) = self.state.step(event, now, self.quiet_window);
        self.state = next;
        effect
    }

    /// Raw input while dragging or typing. Returns the clamped value shown.
    pub fn on_user_edit(&mut self, value: i64) -> u8 {
        self.apply(EditEvent::UserEdit(value));
        self.state.displayed
    }

    pub fn on_interaction_start(&mut self) {
        self.apply(EditEvent::InteractionStart);
    }

    pub fn on_interaction_end(&mut self) {
        self.apply(EditEvent::InteractionEnd);
    }

    /// Commit the displayed value. The returned ticket must be sent to the
    /// server and its outcome reported back.
    pub fn commit(&mut self) -> CommitTicket {
        let ticket = self.state.begin_commit(self.clock.now());
        tracing::info!(opening = ticket.value, seq = ticket.seq, "valve commit");
        ticket
    }

    pub fn commit_succeeded(&mut self, ticket: CommitTicket) {
        self.apply(EditEvent::CommitAccepted(ticket));
    }

    /// Restore `dirty` and the previous commit instant; the displayed value
    /// keeps the attempted opening until the next reconciliation.
    pub fn commit_failed(&mut self, ticket: CommitTicket) {
        self.apply(EditEvent::CommitRejected(ticket));
    }

    /// Offer a server opening. Returns true if the displayed value changed.
    pub fn reconcile(&mut self, server_opening: i64) -> bool {
        match self.apply(EditEvent::ServerValue(server_opening)) {
            EditEffect::Overwritten { previous } => {
                tracing::debug!(
                    from = previous,
                    to = self.state.displayed,
                    "slider follows server"
                );
                true
            }
            EditEffect::Held(reason) => {
                tracing::trace!(?reason, server_opening, "server opening held back");
                false
            }
            _ => false,
        }
    }

    /// Start a fresh editing session after entering or leaving MANUAL.
    pub fn reset_for_mode_switch(&mut self) {
        self.apply(EditEvent::ModeSwitched);
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn displayed(&self) -> u8 {
        self.state.displayed
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty
    }

    pub fn is_interacting(&self) -> bool {
        self.state.interacting
    }

    pub fn phase(&self) -> EditPhase {
        self.state.phase(self.clock.now(), self.quiet_window)
    }

    pub fn quiet_window(&self) -> Duration {
        self.quiet_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tank_traits::ManualClock;

    fn controller() -> (EditableValueController<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (
            EditableValueController::with_clock(clock.clone(), DEFAULT_QUIET_WINDOW),
            clock,
        )
    }

    #[test]
    fn idle_controller_follows_server() {
        let (mut c, _) = controller();
        assert!(c.reconcile(50));
        assert!(c.reconcile(85));
        assert_eq!(c.displayed(), 85);
        assert!(!c.reconcile(85), "same value is not a change");
        assert_eq!(c.phase(), EditPhase::Idle);
    }

    #[test]
    fn dirty_edit_is_not_clobbered() {
        let (mut c, _) = controller();
        c.reconcile(40);
        c.on_user_edit(70);
        assert!(!c.reconcile(40));
        assert_eq!(c.displayed(), 70);
        assert_eq!(c.phase(), EditPhase::Editing);
    }

    #[test]
    fn quiet_window_boundary_is_exclusive() {
        let (mut c, clock) = controller();
        c.on_user_edit(70);
        let t = c.commit();
        c.commit_succeeded(t);
        clock.advance_ms(2000);
        assert!(!c.reconcile(40), "exactly W after commit is still quiet");
        clock.advance_ms(1);
        assert!(c.reconcile(40));
        assert_eq!(c.displayed(), 40);
    }

    #[test]
    fn in_flight_commit_holds_past_window() {
        let (mut c, clock) = controller();
        c.on_user_edit(70);
        let _t = c.commit();
        clock.advance_ms(5000);
        assert!(!c.reconcile(40));
        assert_eq!(c.phase(), EditPhase::Committing);
    }

    #[test]
    fn rejected_commit_restores_dirty_and_window() {
        let (mut c, clock) = controller();
        c.on_user_edit(70);
        let t = c.commit();
        assert!(!c.is_dirty());
        c.commit_failed(t);
        assert!(c.is_dirty());
        assert_eq!(c.displayed(), 70);
        assert_eq!(c.state().last_commit, None);
        clock.advance_ms(10);
        assert!(!c.reconcile(40));
    }

    #[test]
    fn rejected_clean_commit_resumes_tracking() {
        let (mut c, _) = controller();
        c.reconcile(40);
        let t = c.commit();
        c.commit_failed(t);
        assert!(!c.is_dirty());
        assert!(c.reconcile(45), "no quiet window from a failed commit");
    }

    #[test]
    fn stale_outcome_is_ignored() {
        let (mut c, _) = controller();
        c.on_user_edit(60);
        let first = c.commit();
        c.on_user_edit(65);
        let second = c.commit();
        c.commit_failed(first);
        assert!(c.state().in_flight.is_some());
        assert!(!c.is_dirty());
        c.commit_succeeded(second);
        assert!(c.state().in_flight.is_none());
    }

    #[test]
    fn every_commit_ticket_is_the_one_in_flight() {
        let (mut c, _) = controller();
        c.on_user_edit(60);
        let first = c.commit();
        let second = c.commit();
        assert_eq!((first.seq, second.seq), (1, 2));
        assert_eq!(c.state().in_flight.map(|f| f.ticket), Some(second));
        c.commit_succeeded(second);
        assert!(c.state().in_flight.is_none());
    }

    #[test]
    fn step_commit_matches_begin_commit() {
        let now = Instant::now();
        let start = EditState {
            dirty: true,
            ..EditState::new(42)
        };
        let (stepped, effect) = start.step(EditEvent::Commit, now, DEFAULT_QUIET_WINDOW);
        let mut direct = start;
        let ticket = direct.begin_commit(now);
        assert_eq!(effect, EditEffect::Send(ticket));
        assert_eq!(stepped, direct);
    }

    #[test]
    fn superseded_rejection_restores_prior_point() {
        let (mut c, _) = controller();
        c.on_user_edit(60);
        let _first = c.commit();
        c.on_user_edit(65);
        let second = c.commit();
        c.commit_failed(second);
        assert!(c.is_dirty());
        assert_eq!(c.state().last_commit, None);
    }

    #[test]
    fn accepted_commit_releases_stuck_gesture() {
        let (mut c, _) = controller();
        c.on_interaction_start();
        c.on_user_edit(30);
        let t = c.commit();
        assert!(c.is_interacting());
        c.commit_succeeded(t);
        assert!(!c.is_interacting());
        assert_eq!(c.phase(), EditPhase::AwaitingConfirm);
    }

    #[test]
    fn interaction_locks_even_when_clean() {
        let (mut c, clock) = controller();
        c.reconcile(20);
        c.on_interaction_start();
        clock.advance_ms(10_000);
        assert!(!c.reconcile(90));
        c.on_interaction_end();
        assert!(c.reconcile(90));
    }

    #[test]
    fn mode_switch_clears_edit_session() {
        let (mut c, _) = controller();
        c.on_interaction_start();
        c.on_user_edit(10);
        let t = c.commit();
        c.on_user_edit(15);
        c.reset_for_mode_switch();
        assert!(!c.is_dirty());
        assert!(!c.is_interacting());
        c.commit_failed(t);
        assert!(!c.is_dirty(), "old commit outcome must not revive dirty");
    }

    #[test]
    fn user_edit_clamps() {
        let (mut c, _) = controller();
        assert_eq!(c.on_user_edit(-5), 0);
        assert_eq!(c.on_user_edit(0), 0);
        assert_eq!(c.on_user_edit(100), 100);
        assert_eq!(c.on_user_edit(105), 100);
        assert_eq!(c.on_user_edit(150), 100);
    }

    #[test]
    fn hold_precedence_interacting_first() {
        let now = Instant::now();
        let s = EditState {
            dirty: true,
            interacting: true,
            ..EditState::new(10)
        };
        assert_eq!(
            s.hold_reason(now, DEFAULT_QUIET_WINDOW),
            Some(HoldReason::Interacting)
        );
    }
}
