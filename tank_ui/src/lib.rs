#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Text dashboard for a terminal.
//!
//! `TextRenderer` implements `tank_core::Renderer` by writing one full frame
//! per paint. It only reads the view it is given.

pub mod style;
pub mod widgets;

use std::fmt::Write as _;
use std::io::Write;
use tank_core::edit::EditPhase;
use tank_core::view::PaintResult;
use tank_core::{DashboardView, Renderer};

pub use style::Style;

const GAUGE_WIDTH: usize = 30;
const SPARK_WIDTH: usize = 60;
const CLEAR: &str = "\x1b[2J\x1b[H";

fn phase_label(phase: EditPhase) -> &'static str {
    match phase {
        EditPhase::Idle => "following server",
        EditPhase::Editing => "edited, not applied",
        EditPhase::Interacting => "dragging",
        EditPhase::Committing => "sending",
        EditPhase::AwaitingConfirm => "applied, waiting for server",
    }
}

/// Lay out one frame. Lines end with `\n`.
pub fn frame(view: &DashboardView, style: Style) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "Tank level monitor  {} {}",
        style.connection_badge(view.server_reachable),
        style.mode_badge(view.mode)
    );
    let _ = writeln!(out, "Water level   {:.2} cm", view.water_level);
    let _ = writeln!(
        out,
        "Valve         {} {:>3}%",
        widgets::gauge(view.valve_opening, GAUGE_WIDTH),
        view.valve_opening
    );
    let link = if view.device_linked {
        style.good("linked")
    } else {
        style.bad("no link")
    };
    let _ = writeln!(out, "Level sensor  {link}");
    let updated = match (view.last_update_age, view.server_time_ms) {
        (Some(age), Some(ms)) => format!("{} ({})", widgets::age(age), widgets::clock_time(ms)),
        (Some(age), None) => widgets::age(age),
        (None, _) => "never".to_string(),
    };
    let _ = writeln!(out, "Last update   {}", style.dim(&updated));
    out.push('\n');

    if let Some(manual) = view.manual {
        let _ = writeln!(
            out,
            "Manual valve  {} {:>3}%  {}",
            widgets::gauge(manual.displayed, GAUGE_WIDTH),
            manual.displayed,
            style.dim(phase_label(manual.phase))
        );
        let _ = writeln!(
            out,
            "{}",
            style.dim("  edit <0-100> | drag <0-100> | grab | release | apply | set <0-100>")
        );
    } else if let Some(info) = view.info_message {
        let _ = writeln!(out, "{info}");
    }
    out.push('\n');

    let levels: Vec<f32> = view.history.iter().map(|p| p.level).collect();
    if levels.is_empty() {
        let _ = writeln!(out, "History       {}", style.dim("no readings yet"));
    } else {
        let (lo, hi) = levels
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let _ = writeln!(
            out,
            "History       {}  {lo:.2}..{hi:.2} cm ({} readings)",
            widgets::sparkline(&levels, SPARK_WIDTH),
            levels.len()
        );
    }

    for notice in &view.notices {
        let _ = writeln!(out, "{}", style.notice(notice.level, &notice.message));
    }
    out
}

/// Writes frames to any `Write` sink, optionally clearing the screen first.
pub struct TextRenderer<W: Write> {
    out: W,
    style: Style,
    clear: bool,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, style: Style) -> Self {
        Self {
            out,
            style,
            clear: false,
        }
    }

    /// Redraw in place instead of appending frames.
    pub fn clearing(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn init(&mut self) -> PaintResult {
        if self.clear {
            self.out.write_all(CLEAR.as_bytes())?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn paint(&mut self, view: &DashboardView) -> PaintResult {
        if self.clear {
            self.out.write_all(CLEAR.as_bytes())?;
        }
        self.out.write_all(frame(view, self.style).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tank_core::mode::AUTOMATIC_INFO;
    use tank_core::{HistoryPoint, ManualControls, Notice, NoticeLevel};
    use tank_traits::Mode;

    fn view(mode: Mode) -> DashboardView {
        DashboardView {
            mode,
            water_level: 23.456,
            valve_opening: 40,
            device_linked: true,
            server_reachable: true,
            server_time_ms: None,
            last_update_age: Some(Duration::from_millis(200)),
            history: vec![
                HistoryPoint {
                    timestamp_ms: 1,
                    level: 20.0,
                },
                HistoryPoint {
                    timestamp_ms: 2,
                    level: 25.0,
                },
            ],
            manual: None,
            info_message: None,
            notices: Vec::new(),
        }
    }

    #[test]
    fn automatic_frame_shows_info_not_slider() {
        let mut v = view(Mode::Automatic);
        v.info_message = Some(AUTOMATIC_INFO);
        let f = frame(&v, Style::PLAIN);
        assert!(f.contains("[Connected] [AUTOMATIC]"));
        assert!(f.contains("23.46 cm"));
        assert!(f.contains(AUTOMATIC_INFO));
        assert!(!f.contains("Manual valve"));
        assert!(f.contains("20.00..25.00 cm (2 readings)"));
    }

    #[test]
    fn manual_frame_shows_slider_and_phase() {
        let mut v = view(Mode::Manual);
        v.manual = Some(ManualControls {
            displayed: 70,
            dirty: true,
            phase: EditPhase::Editing,
        });
        let f = frame(&v, Style::PLAIN);
        assert!(f.contains("Manual valve"));
        assert!(f.contains(" 70%"));
        assert!(f.contains("edited, not applied"));
    }

    #[test]
    fn outage_frame() {
        let mut v = view(Mode::NotAvailable);
        v.server_reachable = false;
        v.device_linked = false;
        v.last_update_age = None;
        v.history.clear();
        v.notices.push(Notice {
            level: NoticeLevel::Error,
            message: "Failed to set valve. Check connection to the server.".into(),
            raised_at: Instant::now(),
        });
        let f = frame(&v, Style::PLAIN);
        assert!(f.contains("[Disconnected] [NOT AVAILABLE]"));
        assert!(f.contains("no link"));
        assert!(f.contains("Last update   never"));
        assert!(f.contains("no readings yet"));
        assert!(f.contains("error: Failed to set valve."));
    }

    #[test]
    fn renderer_writes_frames() {
        let mut r = TextRenderer::new(Vec::new(), Style::PLAIN);
        r.init().unwrap();
        r.paint(&view(Mode::Automatic)).unwrap();
        r.paint(&view(Mode::Automatic)).unwrap();
        let text = String::from_utf8(r.into_inner()).unwrap();
        assert_eq!(text.matches("Tank level monitor").count(), 2);
        assert!(!text.contains(CLEAR));
    }

    #[test]
    fn clearing_renderer_redraws_in_place() {
        let mut r = TextRenderer::new(Vec::new(), Style::PLAIN).clearing(true);
        r.paint(&view(Mode::Manual)).unwrap();
        let text = String::from_utf8(r.into_inner()).unwrap();
        assert!(text.starts_with(CLEAR));
    }

    #[test]
    fn colored_badges_keep_their_text() {
        let s = Style { color: true };
        assert!(s.mode_badge(Mode::Manual).contains("[MANUAL]"));
        assert!(s.connection_badge(false).contains("Disconnected"));
    }
}
