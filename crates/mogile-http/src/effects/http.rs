use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::Stream;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

use super::body::ResponseBody;
use super::source::{ContentSource, pump_body};
use crate::core::{Headers, StatusLine, encode_request_head, is_success, parse_status_line};
use crate::data::{Method, TransferOptions, TransferRequest};
use crate::error::TransferError;

/// A boxed stream type for chunked payloads.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Longest accepted status or header line.
const MAX_HEAD_LINE: u64 = 8 * 1024;

/// Most header lines accepted in one response.
const MAX_HEADERS: usize = 128;

/// Run `fut` under an optional per-step limit.
pub(crate) async fn timed<F: Future>(
    limit: Option<Duration>,
    phase: &'static str,
    fut: F,
) -> Result<F::Output, TransferError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| TransferError::Timeout(phase)),
        None => Ok(fut.await),
    }
}

/// Performs one HTTP/1.0 request per call over a fresh TCP connection.
///
/// There is no pooling and no retry here; callers decide what a failure
/// means for the replica set.
#[derive(Debug, Clone, Default)]
pub struct HttpTransfer {
    options: TransferOptions,
}

impl HttpTransfer {
    pub fn new(options: TransferOptions) -> Self { Self { options } }

    pub fn options(&self) -> &TransferOptions { &self.options }

    /// Send `request`, stream `body` if given, and parse the response head.
    ///
    /// A PUT must come with a body whose length matches the request's
    /// declared `Content-Length`.
    pub async fn perform(
        &self,
        request: &TransferRequest,
        body: Option<ContentSource>,
    ) -> Result<TransferResponse, TransferError> {
        let declared = request.content_length().unwrap_or(0);
        let actual = body.as_ref().map_or(0, ContentSource::length);
        if actual != declared {
            return Err(TransferError::LengthMismatch { declared, actual });
        }

        let mut conn = self.open(request).await?;
        if let Some(source) = body {
            let chunks = source.into_chunks(self.options.chunk_size);
            pump_body(std::slice::from_mut(&mut conn), chunks, declared)
                .await
                .map_err(|e| e.error)?;
        }
        conn.finish().await
    }

    /// Connect and send the request head. The body, if any, is written
    /// through the returned [`Connection`].
    pub async fn open(&self, request: &TransferRequest) -> Result<Connection, TransferError> {
        let addr = socket_addr(request.url())?;
        debug!(method = %request.method(), url = %request.url(), "opening connection");

        let stream = timed(self.options.connect_timeout, "connecting", TcpStream::connect(&addr))
            .await?
            .map_err(|source| TransferError::Connect {
                addr: addr.clone(),
                source,
            })?;

        let mut conn = Connection {
            stream:  BufReader::new(stream),
            method:  request.method(),
            url:     request.url().to_string(),
            options: self.options.clone(),
        };
        let head = encode_request_head(request);
        conn.write_chunk(&head).await?;
        Ok(conn)
    }
}

fn socket_addr(url: &Url) -> Result<String, TransferError> {
    let host = url
        .host_str()
        .ok_or_else(|| TransferError::UnsupportedPath(url.to_string()))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| TransferError::UnsupportedPath(url.to_string()))?;
    Ok(format!("{host}:{port}"))
}

/// An open request whose head has been sent.
///
/// Dropping it closes the socket.
#[derive(Debug)]
pub struct Connection {
    stream:  BufReader<TcpStream>,
    method:  Method,
    url:     String,
    options: TransferOptions,
}

impl Connection {
    pub fn url(&self) -> &str { &self.url }

    /// Write raw bytes to the peer.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), TransferError> {
        timed(
            self.options.write_timeout,
            "writing request",
            self.stream.get_mut().write_all(chunk),
        )
        .await??;
        Ok(())
    }

    /// Flush the request and read the response head.
    pub async fn finish(mut self) -> Result<TransferResponse, TransferError> {
        timed(self.options.write_timeout, "writing request", self.stream.get_mut().flush()).await??;

        let line = self.read_line().await?;
        if line.is_empty() {
            return Err(TransferError::BadResponse(
                "connection closed before status line".into(),
            ));
        }
        let status = parse_status_line(&line)?;

        let mut headers = Headers::new();
        let mut count = 0;
        loop {
            let line = self.read_line().await?;
            // some nodes close right after the last header without a blank line
            if line.is_empty() || line == "\r\n" || line == "\n" {
                break;
            }
            count += 1;
            if count > MAX_HEADERS {
                return Err(TransferError::BadResponse("too many header lines".into()));
            }
            if !headers.push_line(&line) {
                debug!(url = %self.url, line = line.trim_end(), "ignoring malformed header line");
            }
        }

        debug!(
            method = %self.method,
            url = %self.url,
            status = status.status,
            "response received"
        );

        let length = if self.method.expects_body() {
            headers.content_length()?
        } else {
            Some(0)
        };
        let body = ResponseBody::new(
            self.stream,
            length,
            self.options.read_timeout,
            self.options.chunk_size,
        );

        Ok(TransferResponse {
            status,
            headers,
            body,
        })
    }

    async fn read_line(&mut self) -> Result<String, TransferError> {
        let mut buf = Vec::new();
        let read = timed(
            self.options.read_timeout,
            "reading response head",
            (&mut self.stream).take(MAX_HEAD_LINE).read_until(b'\n', &mut buf),
        )
        .await??;
        if read as u64 == MAX_HEAD_LINE && !buf.ends_with(b"\n") {
            return Err(TransferError::BadResponse("response head line too long".into()));
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Status, headers and the not-yet-consumed body of one response.
#[derive(Debug)]
pub struct TransferResponse {
    status:  StatusLine,
    headers: Headers,
    body:    ResponseBody,
}

impl TransferResponse {
    pub fn status(&self) -> u16 { self.status.status }

    pub fn reason(&self) -> &str { &self.status.reason }

    pub fn headers(&self) -> &Headers { &self.headers }

    pub fn is_success(&self) -> bool { is_success(self.status.status) }

    /// The declared length, or `None` when absent or unparseable.
    pub fn content_length(&self) -> Option<u64> { self.headers.content_length().ok().flatten() }

    /// Fail with [`TransferError::UnexpectedStatus`] unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self, TransferError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransferError::UnexpectedStatus {
                status: self.status.status,
                reason: self.status.reason,
            })
        }
    }

    pub fn into_body(self) -> ResponseBody { self.body }
}
