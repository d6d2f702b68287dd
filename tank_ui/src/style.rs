//! Badge and notice styling. Color is decided once by the caller.

use owo_colors::OwoColorize;
use tank_core::NoticeLevel;
use tank_traits::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
}

impl Style {
    pub const PLAIN: Self = Self { color: false };

    pub fn good(self, text: &str) -> String {
        if self.color {
            format!("{}", text.green())
        } else {
            text.to_string()
        }
    }

    pub fn bad(self, text: &str) -> String {
        if self.color {
            format!("{}", text.red())
        } else {
            text.to_string()
        }
    }

    pub fn accent(self, text: &str) -> String {
        if self.color {
            format!("{}", text.cyan())
        } else {
            text.to_string()
        }
    }

    pub fn dim(self, text: &str) -> String {
        if self.color {
            format!("{}", text.dimmed())
        } else {
            text.to_string()
        }
    }

    pub fn connection_badge(self, reachable: bool) -> String {
        if reachable {
            self.good("[Connected]")
        } else {
            self.bad("[Disconnected]")
        }
    }

    pub fn mode_badge(self, mode: Mode) -> String {
        let text = format!("[{}]", mode.label());
        match mode {
            Mode::Automatic => self.accent(&text),
            Mode::Manual => {
                if self.color {
                    format!("{}", text.yellow())
                } else {
                    text
                }
            }
            Mode::Unconnected | Mode::NotAvailable => self.bad(&text),
        }
    }

    pub fn notice(self, level: NoticeLevel, message: &str) -> String {
        match level {
            NoticeLevel::Info => self.accent(&format!("info: {message}")),
            NoticeLevel::Error => self.bad(&format!("error: {message}")),
        }
    }
}
