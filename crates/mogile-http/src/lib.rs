//! Replicated HTTP transport for MogileFS storage nodes.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable options, requests and replica descriptors
//! - [`core`] - Pure request serialization and response parsing
//! - [`effects`] - Socket and file I/O
//!
//! # Key Features
//!
//! - **Failover reads**: [`FailoverReader`] walks the replica list in order
//!   until one serves the key
//! - **Replicated writes**: [`ReplicatedWriter`] fans one payload out to every
//!   replica and fails unless all of them accept it
//! - **Bounded memory**: bodies move in chunks in both directions; nothing is
//!   buffered whole unless the caller asks for it
//! - **Scoped sockets**: one fresh connection per attempt, closed on every exit
//!   path including a dropped [`ResponseBody`]

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::is_success;
pub use data::{DEFAULT_CHUNK_SIZE, Method, Replica, TransferOptions, TransferRequest, parse_replica_url};
pub use effects::{
    BoxStream, ContentChunks, ContentSink, ContentSource, FailoverReader, HttpTransfer,
    ReplicatedWriter, ResponseBody, TransferResponse,
};
pub use error::{Error, ReplicaFailure, Result, TransferError};
