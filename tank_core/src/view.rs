//! Read-only projection of session state and the paint seam.

use crate::cache::HistoryPoint;
use crate::edit::EditPhase;
use crate::session::Notice;
use std::time::Duration;
use tank_traits::Mode;

/// Error type at the renderer boundary; any backend can plug in.
pub type PaintResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Slider group, present only in MANUAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualControls {
    pub displayed: u8,
    pub dirty: bool,
    pub phase: EditPhase,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub mode: Mode,
    pub water_level: f32,
    pub valve_opening: u8,
    pub device_linked: bool,
    pub server_reachable: bool,
    pub server_time_ms: Option<u64>,
    /// Time since the last successful status poll.
    pub last_update_age: Option<Duration>,
    pub history: Vec<HistoryPoint>,
    pub manual: Option<ManualControls>,
    /// Shown instead of the manual controls in AUTOMATIC.
    pub info_message: Option<&'static str>,
    pub notices: Vec<Notice>,
}

/// Draws frames. Painting must not feed back into session state; user
/// intent travels through the session's event channel instead.
pub trait Renderer {
    /// Called once before the first frame.
    fn init(&mut self) -> PaintResult {
        Ok(())
    }

    fn paint(&mut self, view: &DashboardView) -> PaintResult;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn init(&mut self) -> PaintResult {
        (**self).init()
    }

    fn paint(&mut self, view: &DashboardView) -> PaintResult {
        (**self).paint(view)
    }
}
