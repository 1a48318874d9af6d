//! Immutable data types for replicated transfers.
//!
//! Requests, replica descriptors and options are plain values that are
//! built once per operation and passed down to the effects layer.

pub mod options;
pub mod replica;
pub mod request;

pub use options::{DEFAULT_CHUNK_SIZE, TransferOptions};
pub use replica::Replica;
pub use request::{Method, TransferRequest, parse_replica_url};
