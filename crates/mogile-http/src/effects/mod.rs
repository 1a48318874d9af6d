//! I/O operations against storage nodes.
//!
//! Everything that touches a socket or a local file lives here; the pure
//! parsing it relies on is in [`crate::core`].

mod body;
mod failover;
mod http;
mod source;
mod writer;

pub use body::ResponseBody;
pub use failover::FailoverReader;
pub use http::{BoxStream, Connection, HttpTransfer, TransferResponse};
pub use source::{ContentChunks, ContentSink, ContentSource};
pub use writer::ReplicatedWriter;
