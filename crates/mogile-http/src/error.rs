//! Error types for mogile-http.

use std::fmt;
use std::io;

use thiserror::Error;

/// Failure of a single request against a single replica.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr:   String,
        #[source]
        source: io::Error,
    },

    #[error("bad HTTP response: {0}")]
    BadResponse(String),

    #[error("response body truncated: expected {expected} bytes, got {received}")]
    TruncatedBody { expected: u64, received: u64 },

    #[error("timed out while {0}")]
    Timeout(&'static str),

    #[error("unexpected HTTP status {status} {reason}")]
    UnexpectedStatus { status: u16, reason: String },

    #[error("unsupported path (not reachable over HTTP): {0}")]
    UnsupportedPath(String),

    #[error("content length mismatch: declared {declared} bytes, produced {actual}")]
    LengthMismatch { declared: u64, actual: u64 },

    #[error("failed to read content source: {0}")]
    Source(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransferError {
    /// Errors caused by the local content rather than by the replica.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            TransferError::LengthMismatch { .. }
                | TransferError::UnsupportedPath(_)
                | TransferError::Source(_)
        )
    }
}

/// One replica that did not serve a request, kept for diagnostics.
#[derive(Debug)]
pub struct ReplicaFailure {
    pub url:   String,
    pub error: TransferError,
}

impl fmt::Display for ReplicaFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.error)
    }
}

/// Failure of a whole replicated operation.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("unable to read key {key:?} from any of {} replica(s){}", .failures.len(), format_failures(.failures))]
    UnreachableData {
        key:      String,
        failures: Vec<ReplicaFailure>,
    },

    #[error("store of key {key:?} failed on {failure}")]
    StoreFailed {
        key:     String,
        failure: ReplicaFailure,
    },

    #[error("no replicas available for key {key:?}")]
    NoReplicas { key: String },
}

fn format_failures(failures: &[ReplicaFailure]) -> String {
    failures.iter().map(|f| format!("; {f}")).collect()
}

pub type Result<T> = std::result::Result<T, Error>;
