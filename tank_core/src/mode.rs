//! Mode state machine over {Unconnected, Automatic, Manual, NotAvailable}.
//!
//! The visible mode only ever follows snapshots (or a failed poll). A mode
//! request is sent to the server and confirmed by the next snapshot; nothing
//! is set optimistically.

use crate::error::SessionError;
use tank_traits::{Mode, ModeCommand};

/// Message shown in place of the manual controls outside MANUAL.
pub const AUTOMATIC_INFO: &str =
    "The valve is regulated automatically from the water level. Switch to MANUAL to set it.";

/// Result of applying a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Unchanged,
    Changed { from: Mode, to: Mode },
}

impl ModeChange {
    /// True when the transition entered or left MANUAL.
    pub fn crosses_manual(self) -> bool {
        match self {
            Self::Unchanged => false,
            Self::Changed { from, to } => from.is_manual() != to.is_manual(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ModeController {
    current: Mode,
    /// Request sent and not yet confirmed by a snapshot.
    requested: Option<ModeCommand>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Mode {
        self.current
    }

    /// Validate a mode request and remember it as pending. The caller sends
    /// the returned command; the visible mode is untouched.
    pub fn request_mode(&mut self, target: Mode) -> Result<ModeCommand, SessionError> {
        let cmd = ModeCommand::try_from(target).map_err(SessionError::InvalidModeTarget)?;
        self.requested = Some(cmd);
        Ok(cmd)
    }

    /// The request for `cmd` failed; the mode stays as it was.
    pub fn request_failed(&mut self, cmd: ModeCommand) {
        if self.requested == Some(cmd) {
            self.requested = None;
        }
    }

    pub fn pending_request(&self) -> Option<ModeCommand> {
        self.requested
    }

    /// Adopt the mode from a snapshot or a failed poll.
    pub fn apply(&mut self, mode: Mode) -> ModeChange {
        if let Some(cmd) = self.requested
            && Mode::from(cmd) == mode
        {
            self.requested = None;
        }
        if mode == self.current {
            return ModeChange::Unchanged;
        }
        let from = std::mem::replace(&mut self.current, mode);
        tracing::info!(%from, to = %mode, "mode changed");
        ModeChange::Changed { from, to: mode }
    }

    /// Manual controls (slider, apply button) are shown only in MANUAL.
    pub fn manual_controls_visible(&self) -> bool {
        self.current.is_manual()
    }

    /// Informational text shown instead of the manual controls in AUTOMATIC.
    pub fn info_message(&self) -> Option<&'static str> {
        (self.current == Mode::Automatic).then_some(AUTOMATIC_INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn starts_unconnected_without_controls() {
        let m = ModeController::new();
        assert_eq!(m.current(), Mode::Unconnected);
        assert!(!m.manual_controls_visible());
        assert_eq!(m.info_message(), None);
    }

    #[rstest]
    #[case(Mode::Unconnected, Mode::Manual, true)]
    #[case(Mode::Manual, Mode::Automatic, true)]
    #[case(Mode::Manual, Mode::NotAvailable, true)]
    #[case(Mode::NotAvailable, Mode::Manual, true)]
    #[case(Mode::Automatic, Mode::NotAvailable, false)]
    #[case(Mode::Unconnected, Mode::Automatic, false)]
    fn manual_crossings(#[case] from: Mode, #[case] to: Mode, #[case] crosses: bool) {
        let mut m = ModeController::new();
        m.apply(from);
        assert_eq!(m.apply(to).crosses_manual(), crosses);
    }

    #[test]
    fn repeated_mode_is_unchanged() {
        let mut m = ModeController::new();
        m.apply(Mode::Manual);
        assert_eq!(m.apply(Mode::Manual), ModeChange::Unchanged);
        assert!(m.manual_controls_visible());
    }

    #[test]
    fn request_does_not_change_visible_mode() {
        let mut m = ModeController::new();
        m.apply(Mode::Automatic);
        let cmd = m.request_mode(Mode::Manual).unwrap();
        assert_eq!(cmd, ModeCommand::Manual);
        assert_eq!(m.current(), Mode::Automatic);
        assert_eq!(m.pending_request(), Some(ModeCommand::Manual));

        m.apply(Mode::Manual);
        assert_eq!(m.pending_request(), None);
    }

    #[test]
    fn failed_request_leaves_mode() {
        let mut m = ModeController::new();
        m.apply(Mode::Automatic);
        let cmd = m.request_mode(Mode::Manual).unwrap();
        m.request_failed(cmd);
        assert_eq!(m.current(), Mode::Automatic);
        assert_eq!(m.pending_request(), None);
    }

    #[rstest]
    #[case(Mode::Unconnected)]
    #[case(Mode::NotAvailable)]
    fn only_operator_modes_can_be_requested(#[case] target: Mode) {
        let mut m = ModeController::new();
        assert!(matches!(
            m.request_mode(target),
            Err(SessionError::InvalidModeTarget(t)) if t == target
        ));
    }

    #[test]
    fn automatic_shows_info_message() {
        let mut m = ModeController::new();
        m.apply(Mode::Automatic);
        assert_eq!(m.info_message(), Some(AUTOMATIC_INFO));
    }
}
