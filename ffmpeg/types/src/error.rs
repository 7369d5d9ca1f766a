/*!
    Error types shared by the encode, decode and sink crates.
*/

use thiserror::Error;

/**
    Errors produced while configuring, running or verifying an encode session.

    Every variant except [`Error::Submit`] ends the session.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("codec unavailable: {0}")]
    CodecUnavailable(String),

    #[error("encoder rejected configuration: {0}")]
    OpenFailed(String),

    #[error("allocation failed: {0}")]
    Allocation(String),

    #[error("encoder refused frame: {0}")]
    Submit(String),

    #[error("output sink error: {0}")]
    Sink(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("verification failed: {0}")]
    Verify(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn codec_unavailable(msg: impl Into<String>) -> Self {
        Self::CodecUnavailable(msg.into())
    }

    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    pub fn submit(msg: impl Into<String>) -> Self {
        Self::Submit(msg.into())
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    pub fn verify(msg: impl Into<String>) -> Self {
        Self::Verify(msg.into())
    }

    /**
        Returns true if the session may continue after this error.

        Only a refused frame is recoverable: the session still flushes,
        drains and tears down so buffered output is not lost.
    */
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Submit(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/**
    Error returned by `FromStr` implementations on enum and value types.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
