#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Client-side core of the tank dashboard (transport-agnostic).
//!
//! All server interactions go through the `tank_traits::DashboardApi` trait;
//! all drawing goes through `view::Renderer`.
//!
//! ## Architecture
//!
//! - **Polling**: two repeating fetch obligations on their own threads (`poll`)
//! - **Cache**: last snapshot and history series, replaced wholesale (`cache`)
//! - **Mode**: visible mode follows the server, never set optimistically (`mode`)
//! - **Slider**: local edits reconciled against polled values (`edit`)
//! - **Session**: single-threaded event handling returning actions (`session`)
//! - **Runner**: event loop, command worker and renderer glue (`runner`)
//!
//! ## Reconciliation
//!
//! A polled valve opening replaces the displayed slider value only while the
//! operator is not dragging, has no uncommitted edit, has no command in
//! flight, and the quiet window after the last commit has passed. See
//! `edit::EditState::step` for the full transition table.

pub mod api_error;
pub mod builder;
pub mod cache;
pub mod command;
pub mod config;
pub mod conversions;
pub mod edit;
pub mod error;
pub mod mocks;
pub mod mode;
pub mod poll;
pub mod runner;
pub mod session;
pub mod util;
pub mod view;

pub use builder::{NullRenderer, SessionBuilder};
pub use cache::{HistoryPoint, RemoteStateCache, Snapshot};
pub use command::Command;
pub use config::{ApiCfg, SessionCfg};
pub use edit::{CommitTicket, EditPhase, EditState, EditableValueController};
pub use error::{ApiError, BuildError, SessionError};
pub use mode::{ModeChange, ModeController};
pub use poll::{PollClock, PollIntervals, PollKind, SharedApi};
pub use runner::{SessionHandle, SessionRunner};
pub use session::{Action, Intent, Notice, NoticeLevel, Session, SessionEvent};
pub use view::{DashboardView, ManualControls, Renderer};

/// Fetch one status snapshot outside a session.
pub fn fetch_status(api: &dyn tank_traits::DashboardApi) -> Result<Snapshot, ApiError> {
    api_error::map_result(api.status()).map(|r| Snapshot::from(&r))
}

/// Fetch the history series outside a session.
pub fn fetch_history(api: &dyn tank_traits::DashboardApi) -> Result<Vec<HistoryPoint>, ApiError> {
    api_error::map_result(api.history()).map(|rs| rs.iter().map(HistoryPoint::from).collect())
}

/// Send one command outside a session. The opening is clamped to `[0, 100]`.
pub fn send_valve(api: &dyn tank_traits::DashboardApi, opening: i64) -> Result<u8, ApiError> {
    let value = util::clamp_opening(opening);
    api_error::map_result(api.set_valve(value)).map(|()| value)
}

pub fn send_mode(
    api: &dyn tank_traits::DashboardApi,
    mode: tank_traits::ModeCommand,
) -> Result<(), ApiError> {
    api_error::map_result(api.set_mode(mode))
}
