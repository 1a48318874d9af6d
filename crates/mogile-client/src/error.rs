//! Error types for mogile-client.

use std::io;

use mogile_http::TransferError;
use thiserror::Error;

use crate::tracker::TrackerError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("readonly mogilefs")]
    ReadOnly,

    /// The tracker refused the command, or its reply could not be decoded.
    /// [`TrackerError::code`] is `None` only for the latter.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Http(#[from] mogile_http::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<TransferError> for ClientError {
    fn from(e: TransferError) -> Self { ClientError::Http(mogile_http::Error::Transfer(e)) }
}

pub type Result<T> = std::result::Result<T, ClientError>;
