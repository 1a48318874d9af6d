use std::time::Duration;

/// Default unit for socket reads and body writes.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Per-step limits applied to every transfer.
///
/// Each timeout bounds a single connect, read or write step, not the whole
/// transfer, so a multi-gigabyte body never trips it while bytes keep moving.
/// `None` waits forever.
///
/// # Examples
///
/// ```
/// use mogile_http::TransferOptions;
/// use std::time::Duration;
///
/// let options = TransferOptions::default()
///     .connect_timeout(Some(Duration::from_secs(2)))
///     .chunk_size(16 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    /// Limit for establishing the TCP connection.
    ///
    /// Default: 5s
    pub connect_timeout: Option<Duration>,

    /// Limit for each read of response headers or body.
    ///
    /// Default: 30s
    pub read_timeout: Option<Duration>,

    /// Limit for each write of the request head or a body chunk.
    ///
    /// Default: 30s
    pub write_timeout: Option<Duration>,

    /// Largest chunk read from a socket or pushed to one.
    ///
    /// Default: 64 KiB
    pub chunk_size: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(5)),
            read_timeout:    Some(Duration::from_secs(30)),
            write_timeout:   Some(Duration::from_secs(30)),
            chunk_size:      DEFAULT_CHUNK_SIZE,
        }
    }
}

impl TransferOptions {
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the chunk size. Zero is raised to one byte.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}
