use std::path::Path;

use bytes::Bytes;
use mogile_http::{
    ContentSource, Error as HttpError, FailoverReader, HttpTransfer, ReplicatedWriter, ResponseBody,
    parse_replica_url,
};
use tokio::io::AsyncWrite;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::listing::KeyPage;
use crate::replicas::{ReplicaSet, WritePlan};
use crate::tracker::{Tracker, TrackerError};

/// Key-level access to one domain.
///
/// Every call resolves the key through the tracker first, then moves bytes
/// directly to or from the storage nodes. Calls are independent; a client
/// may be shared behind a reference and used from several tasks.
///
/// # Examples
///
/// ```no_run
/// use mogile_client::{ClientConfig, MogileClient, ScriptedTracker};
///
/// # async fn run() -> mogile_client::Result<()> {
/// let client = MogileClient::new(ScriptedTracker::new(), ClientConfig::new("media"))?;
/// client.store_content("greeting", "text", "hello").await?;
/// let data = client.get_file_data("greeting").await?;
/// assert_eq!(&data[..], b"hello");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MogileClient<T> {
    tracker: T,
    config:  ClientConfig,
    reader:  FailoverReader,
    writer:  ReplicatedWriter,
}

impl<T: Tracker> MogileClient<T> {
    pub fn new(tracker: T, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transfer = HttpTransfer::new(config.transfer_options());
        Ok(Self {
            tracker,
            reader: FailoverReader::new(transfer.clone()),
            writer: ReplicatedWriter::new(transfer),
            config,
        })
    }

    pub fn domain(&self) -> &str { &self.config.domain }

    pub fn is_readonly(&self) -> bool { self.config.readonly }

    pub fn config(&self) -> &ClientConfig { &self.config }

    pub fn tracker(&self) -> &T { &self.tracker }

    /// Replica locations for `key`, in the tracker's order.
    pub async fn get_paths(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.replica_set(key).await?.into_locations())
    }

    /// Like [`get_paths`](Self::get_paths), parsed into URLs.
    pub async fn get_uris(&self, key: &str) -> Result<Vec<Url>> {
        self.get_paths(key)
            .await?
            .iter()
            .map(|path| parse_replica_url(path).map_err(ClientError::from))
            .collect()
    }

    /// Open the content of `key` from the first replica that serves it.
    ///
    /// The body streams from the socket; dropping it closes the connection.
    pub async fn open_file(&self, key: &str) -> Result<ResponseBody> {
        let paths = self.get_paths(key).await?;
        Ok(self.reader.read(key, &paths).await?)
    }

    /// The full content of `key`, buffered in memory.
    ///
    /// A replica that fails mid-body is skipped like one that refused the
    /// request; only exhausting every replica is an error.
    pub async fn get_file_data(&self, key: &str) -> Result<Bytes> {
        let paths = self.get_paths(key).await?;
        Ok(self.reader.read_all(key, &paths).await?)
    }

    /// Stream the content of `key` into `writer`, returning the byte count.
    pub async fn get_file_to<W>(&self, key: &str, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let body = self.open_file(key).await?;
        Ok(body.copy_to(writer).await?)
    }

    /// Size of `key` as reported by the first replica answering HEAD.
    ///
    /// `Ok(None)` when no replica reports one; tracker errors still fail.
    pub async fn size(&self, key: &str) -> Result<Option<u64>> {
        let paths = self.get_paths(key).await?;
        Ok(self.reader.size(key, &paths).await)
    }

    /// Store the file at `path` under `key`. An empty `class` uses the
    /// domain default.
    pub async fn store_file(&self, key: &str, class: &str, path: impl AsRef<Path>) -> Result<u64> {
        self.ensure_writable()?;
        let source = ContentSource::from_path(path).await?;
        self.store(key, class, source).await
    }

    /// Store `content` under `key`: bytes, a string, or any
    /// [`ContentSource`] including a callback producer.
    pub async fn store_content(
        &self,
        key: &str,
        class: &str,
        content: impl Into<ContentSource>,
    ) -> Result<u64> {
        self.ensure_writable()?;
        self.store(key, class, content.into()).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.ensure_writable()?;
        self.tracker
            .request("delete", &[("domain", self.domain()), ("key", key)])
            .await?;
        info!(key, "deleted key");
        Ok(())
    }

    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.ensure_writable()?;
        self.tracker
            .request(
                "rename",
                &[("domain", self.domain()), ("from_key", from), ("to_key", to)],
            )
            .await?;
        info!(from, to, "renamed key");
        Ok(())
    }

    /// Ask the tracker to sleep for `seconds`. Diagnostic only.
    pub async fn sleep(&self, seconds: u64) -> Result<()> {
        let duration = seconds.to_string();
        self.tracker.request("sleep", &[("duration", duration.as_str())]).await?;
        Ok(())
    }

    /// One page of keys starting with `prefix`, strictly after `after`.
    ///
    /// A prefix with no matches is an empty page, not an error.
    pub async fn list_keys(&self, prefix: &str, after: Option<&str>, limit: Option<u32>) -> Result<KeyPage> {
        let limit = limit.map(|limit| limit.to_string());
        let mut args = vec![("domain", self.domain()), ("prefix", prefix)];
        if let Some(after) = after {
            args.push(("after", after));
        }
        if let Some(limit) = limit.as_deref() {
            args.push(("limit", limit));
        }

        match self.tracker.request("list_keys", &args).await {
            Ok(response) => Ok(KeyPage::from_response(&response)?),
            Err(err) if err.code() == Some("none_match") => Ok(KeyPage::empty()),
            Err(err) => Err(err.into()),
        }
    }

    /// Like [`list_keys`](Self::list_keys), calling `visit(key, size,
    /// replica_count)` for every key on the page.
    ///
    /// Sizes come from a HEAD against the key's replicas. A key whose
    /// lookup fails, for instance because it vanished after listing, is
    /// reported as `(None, 0)`; only the listing call itself can fail.
    pub async fn list_keys_with<F>(
        &self,
        prefix: &str,
        after: Option<&str>,
        limit: Option<u32>,
        mut visit: F,
    ) -> Result<KeyPage>
    where
        F: FnMut(&str, Option<u64>, usize),
    {
        let page = self.list_keys(prefix, after, limit).await?;
        for key in &page.keys {
            let (size, count) = match self.replica_set(key).await {
                Ok(set) => (self.reader.size(key, set.locations()).await, set.len()),
                Err(error) => {
                    warn!(key = key.as_str(), %error, "no replica info for listed key");
                    (None, 0)
                }
            };
            visit(key, size, count);
        }
        Ok(page)
    }

    /// Walk every key starting with `prefix`, page by page, returning how
    /// many were visited.
    pub async fn each_key<F>(&self, prefix: &str, mut visit: F) -> Result<u64>
    where
        F: FnMut(&str),
    {
        let mut after: Option<String> = None;
        let mut count = 0u64;
        loop {
            let page = self.list_keys(prefix, after.as_deref(), None).await?;
            for key in &page.keys {
                visit(key);
                count += 1;
            }
            match page.advance(after.as_deref()) {
                Some(next) => after = Some(next.to_string()),
                None => break,
            }
        }
        debug!(prefix, count, "listed keys");
        Ok(count)
    }

    /// Every key starting with `prefix`.
    pub async fn collect_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        self.each_key(prefix, |key| keys.push(key.to_string())).await?;
        Ok(keys)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.config.readonly {
            return Err(ClientError::ReadOnly);
        }
        Ok(())
    }

    async fn replica_set(&self, key: &str) -> std::result::Result<ReplicaSet, TrackerError> {
        let response = self
            .tracker
            .request(
                "get_paths",
                &[("domain", self.domain()), ("key", key), ("noverify", "1")],
            )
            .await?;
        ReplicaSet::from_get_paths(&response)
    }

    async fn store(&self, key: &str, class: &str, source: ContentSource) -> Result<u64> {
        let mut open_args = vec![
            ("domain", self.domain()),
            ("key", key),
            ("fid", "0"),
            ("multi_dest", "1"),
        ];
        if !class.is_empty() {
            open_args.insert(1, ("class", class));
        }
        let response = self.tracker.request("create_open", &open_args).await?;
        let plan = WritePlan::from_create_open(&response)?;
        let Some(first) = plan.replicas.first() else {
            return Err(HttpError::NoReplicas { key: key.to_string() }.into());
        };
        debug!(key, replicas = plan.replicas.len(), fid = ?plan.fid, "allocated destinations");

        let written = self.writer.write(key, &plan.replicas, source).await?;

        let fid = plan.fid.unwrap_or(0).to_string();
        let devid = first.devid.to_string();
        let size = written.to_string();
        let mut close_args = vec![
            ("fid", fid.as_str()),
            ("devid", devid.as_str()),
            ("domain", self.domain()),
            ("key", key),
            ("path", first.location.as_str()),
            ("size", size.as_str()),
        ];
        if !class.is_empty() {
            close_args.push(("class", class));
        }
        self.tracker.request("create_close", &close_args).await?;

        info!(key, bytes = written, "stored key");
        Ok(written)
    }
}
