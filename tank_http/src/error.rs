use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection refused, DNS failure, timeout, or a body that could not be read.
    #[error("transport: {0}")]
    Transport(String),
    /// Non-2xx answer; `message` is the server's `error` field verbatim when present.
    #[error("{message}")]
    Status { code: u16, message: String },
    /// 2xx answer whose body does not match the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HttpError>;
