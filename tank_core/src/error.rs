use tank_traits::Mode;
use thiserror::Error;

/// Typed outcome of a failed call to the dashboard API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Network error, refused connection, or timeout.
    #[error("transport failure: {0}")]
    Transport(String),
    /// Non-2xx response; `message` is what the operator must see.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// 2xx response with an unparsable body or missing fields.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Status polls treat these as "server unavailable" rather than as operator errors.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Malformed(_))
    }
}

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("renderer failed to initialize: {0}")]
    RendererInit(String),
    #[error("cannot request mode {0}")]
    InvalidModeTarget(Mode),
    #[error("event channel closed")]
    ChannelClosed,
    /// A one-shot command was rejected or could not be delivered.
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing dashboard api")]
    MissingApi,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
