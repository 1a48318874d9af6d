use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::stream;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::http::{BoxStream, timed};
use crate::error::TransferError;

/// Upper bound on the buffer reserved up front when draining into memory.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// The body of a response, read lazily from the socket.
///
/// With a declared `Content-Length` exactly that many bytes are yielded and an
/// early close is a [`TransferError::TruncatedBody`]; without one the body
/// ends when the peer closes. The socket is released as soon as the body is
/// exhausted, fails, or is dropped.
#[derive(Debug)]
pub struct ResponseBody {
    stream:       Option<BufReader<TcpStream>>,
    declared:     Option<u64>,
    received:     u64,
    read_timeout: Option<Duration>,
    chunk_size:   usize,
}

impl ResponseBody {
    pub(crate) fn new(
        stream: BufReader<TcpStream>,
        declared: Option<u64>,
        read_timeout: Option<Duration>,
        chunk_size: usize,
    ) -> Self {
        Self {
            stream: Some(stream),
            declared,
            received: 0,
            read_timeout,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Length announced by the peer, if any.
    pub fn content_length(&self) -> Option<u64> { self.declared }

    /// Bytes handed out so far.
    pub fn received(&self) -> u64 { self.received }

    /// Read the next chunk, at most the configured chunk size.
    ///
    /// Returns `Ok(None)` once the body is complete.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, TransferError> {
        let result = self.read_chunk().await;
        if !matches!(result, Ok(Some(_))) {
            self.stream = None;
        }
        result
    }

    async fn read_chunk(&mut self) -> Result<Option<Bytes>, TransferError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };

        let want = match self.declared {
            Some(total) if total <= self.received => return Ok(None),
            Some(total) => (total - self.received).min(self.chunk_size as u64) as usize,
            None => self.chunk_size,
        };

        let mut buf = BytesMut::zeroed(want);
        let read = timed(self.read_timeout, "reading response body", stream.read(&mut buf)).await??;
        if read == 0 {
            return match self.declared {
                Some(expected) => Err(TransferError::TruncatedBody {
                    expected,
                    received: self.received,
                }),
                None => Ok(None),
            };
        }

        buf.truncate(read);
        self.received += read as u64;
        Ok(Some(buf.freeze()))
    }

    /// Drain the whole body into memory.
    pub async fn bytes(mut self) -> Result<Bytes, TransferError> {
        let capacity = self.declared.unwrap_or(0).min(MAX_PREALLOC) as usize;
        let mut data = BytesMut::with_capacity(capacity);
        while let Some(chunk) = self.chunk().await? {
            data.extend_from_slice(&chunk);
        }
        Ok(data.freeze())
    }

    /// Drain the whole body into `writer`, returning the byte count.
    pub async fn copy_to<W>(mut self, writer: &mut W) -> Result<u64, TransferError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        while let Some(chunk) = self.chunk().await? {
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;
        Ok(self.received)
    }

    /// Adapt the body into a stream of chunks.
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes, TransferError>> {
        Box::pin(stream::try_unfold(self, |mut body| async move {
            Ok::<_, TransferError>(body.chunk().await?.map(|chunk| (chunk, body)))
        }))
    }
}
