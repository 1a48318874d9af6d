//! Pure transformations for replicated transfers.
//!
//! Request serialization and response-head parsing live here so they can be
//! tested without sockets.

mod request;
mod response;
mod validation;

pub use request::encode_request_head;
pub use response::{Headers, StatusLine, parse_status_line};
pub use validation::is_success;
