//! Errors that end a poll cycle.
//!
//! None of these are fatal to the process: the cycle is abandoned, a notice is
//! printed and the next tick tries again.

use crate::snapshot::{FIELD_COUNT, ParseError};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CycleError {
    /// The request could not be sent or did not complete within the timeout.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("bad status: {0}")]
    Status(StatusCode),

    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("too many unparsable fields: {count} of {}", FIELD_COUNT)]
    TooManyUnparsable { count: usize },

    /// A total the usage percentage is computed against was zero.
    #[error("{field} is zero")]
    ZeroDenominator { field: &'static str },
}

/// Coarse classification of a [`CycleError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Structural,
    Tolerance,
    Guard,
}

impl CycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Request { .. } | Self::Status(_) | Self::Body(_) => ErrorKind::Transport,
            Self::Parse(_) => ErrorKind::Structural,
            Self::TooManyUnparsable { .. } => ErrorKind::Tolerance,
            Self::ZeroDenominator { .. } => ErrorKind::Guard,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Request { source, .. } | Self::Body(source) => source.is_timeout(),
            _ => false,
        }
    }
}
