use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use futures_util::future::{BoxFuture, try_join_all};
use futures_util::{FutureExt, TryStreamExt, stream};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use super::http::{BoxStream, Connection};
use crate::error::TransferError;

/// Chunks produced by a [`ContentSource`].
pub type ContentChunks = BoxStream<'static, io::Result<Bytes>>;

/// Chunks a producer may queue ahead of the socket.
const PRODUCER_QUEUE_DEPTH: usize = 4;

type Producer = Box<dyn FnOnce(ContentSink) -> BoxFuture<'static, io::Result<()>> + Send>;

/// A payload of known total length.
///
/// Writers send exactly [`length`](Self::length) bytes; a source that yields
/// more or fewer fails the write with [`TransferError::LengthMismatch`].
pub struct ContentSource {
    length: u64,
    kind:   SourceKind,
}

enum SourceKind {
    InMemory(Bytes),
    FileBacked { file: tokio::fs::File, path: PathBuf },
    CallbackProducer(Producer),
}

impl ContentSource {
    /// Wrap an in-memory value.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            length: data.len() as u64,
            kind:   SourceKind::InMemory(data),
        }
    }

    /// Open a local file; its length is taken now.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = tokio::fs::File::open(&path).await?;
        let length = file.metadata().await?.len();
        Ok(Self {
            length,
            kind: SourceKind::FileBacked { file, path },
        })
    }

    /// Content generated by `producer`, which is called once with a sink and
    /// must push exactly `length` bytes into it.
    ///
    /// # Examples
    ///
    /// ```
    /// use mogile_http::ContentSource;
    ///
    /// let source = ContentSource::from_producer(40, |mut sink| async move {
    ///     for _ in 0..10 {
    ///         sink.write("data").await?;
    ///     }
    ///     Ok(())
    /// });
    /// assert_eq!(source.length(), 40);
    /// ```
    pub fn from_producer<F, Fut>(length: u64, producer: F) -> Self
    where
        F: FnOnce(ContentSink) -> Fut + Send + 'static,
        Fut: Future<Output = io::Result<()>> + Send + 'static,
    {
        Self {
            length,
            kind: SourceKind::CallbackProducer(Box::new(move |sink| producer(sink).boxed())),
        }
    }

    pub fn length(&self) -> u64 { self.length }

    /// Turn the source into a stream of chunks of at most `chunk_size` bytes
    /// (producer chunks are forwarded as pushed).
    ///
    /// A callback producer is started on the current tokio runtime.
    pub fn into_chunks(self, chunk_size: usize) -> ContentChunks {
        let chunk_size = chunk_size.max(1);
        match self.kind {
            SourceKind::InMemory(data) => {
                let chunks: Vec<io::Result<Bytes>> = (0..data.len())
                    .step_by(chunk_size)
                    .map(|start| Ok(data.slice(start..(start + chunk_size).min(data.len()))))
                    .collect();
                Box::pin(stream::iter(chunks))
            }
            SourceKind::FileBacked { file, .. } => {
                Box::pin(stream::try_unfold(file, move |mut file| async move {
                    let mut buf = BytesMut::zeroed(chunk_size);
                    let read = file.read(&mut buf).await?;
                    if read == 0 {
                        return Ok(None);
                    }
                    buf.truncate(read);
                    Ok::<_, io::Error>(Some((buf.freeze(), file)))
                }))
            }
            SourceKind::CallbackProducer(producer) => {
                let (tx, rx) = mpsc::channel(PRODUCER_QUEUE_DEPTH);
                let sink = ContentSink {
                    tx:      tx.clone(),
                    written: 0,
                };
                tokio::spawn(async move {
                    if let Err(err) = producer(sink).await {
                        let _ = tx.send(Err(err)).await;
                    }
                });
                Box::pin(stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                }))
            }
        }
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            SourceKind::InMemory(_) => "InMemory".to_string(),
            SourceKind::FileBacked { path, .. } => format!("FileBacked({})", path.display()),
            SourceKind::CallbackProducer(_) => "CallbackProducer".to_string(),
        };
        f.debug_struct("ContentSource")
            .field("length", &self.length)
            .field("kind", &kind)
            .finish()
    }
}

impl From<Bytes> for ContentSource {
    fn from(data: Bytes) -> Self { Self::from_bytes(data) }
}

impl From<Vec<u8>> for ContentSource {
    fn from(data: Vec<u8>) -> Self { Self::from_bytes(data) }
}

impl From<String> for ContentSource {
    fn from(data: String) -> Self { Self::from_bytes(data) }
}

impl From<&'static str> for ContentSource {
    fn from(data: &'static str) -> Self { Self::from_bytes(data) }
}

impl From<&'static [u8]> for ContentSource {
    fn from(data: &'static [u8]) -> Self { Self::from_bytes(data) }
}

/// Receiving end handed to a callback producer.
pub struct ContentSink {
    tx:      mpsc::Sender<io::Result<Bytes>>,
    written: u64,
}

impl ContentSink {
    /// Push one chunk. Waits while the queue is full.
    ///
    /// Fails with [`io::ErrorKind::BrokenPipe`] once the writer has stopped
    /// consuming, e.g. after a replica failed.
    pub async fn write(&mut self, chunk: impl Into<Bytes>) -> io::Result<()> {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return Ok(());
        }
        let len = chunk.len() as u64;
        self.tx
            .send(Ok(chunk))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "content consumer went away"))?;
        self.written += len;
        Ok(())
    }

    /// Bytes accepted so far.
    pub fn written(&self) -> u64 { self.written }
}

/// A body write that stopped. `replica` is the index of the connection at
/// fault, or `None` when the source itself failed.
#[derive(Debug)]
pub(crate) struct PumpError {
    pub replica: Option<usize>,
    pub error:   TransferError,
}

impl PumpError {
    fn source(error: TransferError) -> Self { Self { replica: None, error } }
}

/// Copy `chunks` to every connection, enforcing the declared length.
///
/// Each chunk is written to all connections concurrently before the next one
/// is pulled, so memory stays bounded by one chunk regardless of replica count.
pub(crate) async fn pump_body(
    conns: &mut [Connection],
    mut chunks: ContentChunks,
    declared: u64,
) -> Result<u64, PumpError> {
    let mut sent = 0u64;
    while let Some(chunk) = chunks
        .try_next()
        .await
        .map_err(|e| PumpError::source(TransferError::Source(e)))?
    {
        if chunk.is_empty() {
            continue;
        }
        let total = sent + chunk.len() as u64;
        if total > declared {
            return Err(PumpError::source(TransferError::LengthMismatch {
                declared,
                actual: total,
            }));
        }

        let chunk = &chunk;
        try_join_all(conns.iter_mut().enumerate().map(|(index, conn)| async move {
            conn.write_chunk(chunk).await.map_err(|error| PumpError {
                replica: Some(index),
                error,
            })
        }))
        .await?;
        sent = total;
    }

    if sent != declared {
        return Err(PumpError::source(TransferError::LengthMismatch {
            declared,
            actual: sent,
        }));
    }
    Ok(sent)
}
