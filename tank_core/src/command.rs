//! Operator commands and the worker thread that sends them.
//!
//! Commands run off the session thread so a slow POST never delays the
//! handling of poll results or user input. The worker sends them in order,
//! one at a time, and reports each outcome as a `SessionEvent::CommandDone`.

use crate::api_error::map_result;
use crate::edit::CommitTicket;
use crate::error::ApiError;
use crate::poll::SharedApi;
use crate::session::SessionEvent;
use crossbeam_channel as xch;
use tank_traits::ModeCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetMode(ModeCommand),
    SetValve(CommitTicket),
}

impl Command {
    /// Send this command synchronously through `api`.
    pub fn execute(self, api: &SharedApi) -> Result<(), ApiError> {
        match self {
            Self::SetMode(mode) => map_result(api.set_mode(mode)),
            Self::SetValve(ticket) => map_result(api.set_valve(ticket.value)),
        }
    }

    /// Operator-facing text when the command could not reach the server.
    pub fn transport_hint(self) -> &'static str {
        match self {
            Self::SetMode(_) => "Failed to change mode. Check connection to the server.",
            Self::SetValve(_) => "Failed to set valve. Check connection to the server.",
        }
    }
}

pub struct CommandWorker {
    tx: Option<xch::Sender<Command>>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl CommandWorker {
    pub fn spawn(api: SharedApi, events: xch::Sender<SessionEvent>) -> Self {
        let (tx, rx) = xch::unbounded::<Command>();
        let join_handle = std::thread::spawn(move || {
            // Ends when every sender is dropped.
            for command in rx {
                let result = command.execute(&api);
                if let Err(e) = &result {
                    tracing::warn!(?command, error = %e, "command failed");
                }
                if events
                    .send(SessionEvent::CommandDone { command, result })
                    .is_err()
                {
                    tracing::debug!("session disconnected, exiting command worker");
                    break;
                }
            }
            tracing::trace!("command worker exiting cleanly");
        });
        Self {
            tx: Some(tx),
            join_handle: Some(join_handle),
        }
    }

    /// Queue a command. Returns false once the worker has shut down.
    pub fn submit(&self, command: Command) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.send(command).is_ok())
    }

    /// Stop accepting commands and wait for queued ones to finish.
    pub fn shutdown(&mut self) {
        self.tx = None;
        if let Some(handle) = self.join_handle.take()
            && let Err(e) = handle.join()
        {
            tracing::warn!(?e, "command worker panicked during shutdown");
        }
    }
}

impl Drop for CommandWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
