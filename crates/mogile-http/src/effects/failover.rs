use bytes::Bytes;
use tracing::{debug, warn};

use super::body::ResponseBody;
use super::http::HttpTransfer;
use crate::data::{TransferRequest, parse_replica_url};
use crate::error::{Error, ReplicaFailure, Result, TransferError};

/// Reads a key from the first replica that serves it.
///
/// Replicas are tried strictly in the order given. Any transport error or
/// non-2xx status moves on to the next one; nothing after the first success
/// is contacted.
#[derive(Debug, Clone, Default)]
pub struct FailoverReader {
    transfer: HttpTransfer,
}

impl FailoverReader {
    pub fn new(transfer: HttpTransfer) -> Self { Self { transfer } }

    /// Open the body of the first replica answering GET with 2xx.
    ///
    /// Fails with [`Error::UnreachableData`] carrying every per-replica
    /// failure when none does.
    pub async fn read<S: AsRef<str>>(&self, key: &str, locations: &[S]) -> Result<ResponseBody> {
        let mut failures = Vec::new();
        for location in locations.iter().map(AsRef::as_ref) {
            match self.try_get(location).await {
                Ok(body) => {
                    debug!(key, url = location, "reading from replica");
                    return Ok(body);
                }
                Err(error) => {
                    warn!(key, url = location, %error, "replica read failed");
                    failures.push(ReplicaFailure {
                        url: location.to_string(),
                        error,
                    });
                }
            }
        }
        Err(Error::UnreachableData {
            key: key.to_string(),
            failures,
        })
    }

    /// The whole body of the first replica that delivers it completely.
    ///
    /// Unlike [`read`](Self::read), a replica that answers 2xx and then
    /// truncates, stalls or resets mid-body is recorded as a failure and the
    /// next replica is tried from scratch.
    pub async fn read_all<S: AsRef<str>>(&self, key: &str, locations: &[S]) -> Result<Bytes> {
        let mut failures = Vec::new();
        for location in locations.iter().map(AsRef::as_ref) {
            let attempt = match self.try_get(location).await {
                Ok(body) => body.bytes().await,
                Err(error) => Err(error),
            };
            match attempt {
                Ok(data) => {
                    debug!(key, url = location, bytes = data.len(), "read from replica");
                    return Ok(data);
                }
                Err(error) => {
                    warn!(key, url = location, %error, "replica read failed");
                    failures.push(ReplicaFailure {
                        url: location.to_string(),
                        error,
                    });
                }
            }
        }
        Err(Error::UnreachableData {
            key: key.to_string(),
            failures,
        })
    }

    /// `Content-Length` of the first replica answering HEAD with 2xx and a
    /// usable length. `None` when no replica does; this never fails.
    pub async fn size<S: AsRef<str>>(&self, key: &str, locations: &[S]) -> Option<u64> {
        for location in locations.iter().map(AsRef::as_ref) {
            match self.try_head(location).await {
                Ok(Some(size)) => return Some(size),
                Ok(None) => {
                    warn!(key, url = location, "replica answered HEAD without a usable length");
                }
                Err(error) => {
                    warn!(key, url = location, %error, "replica HEAD failed");
                }
            }
        }
        None
    }

    async fn try_get(&self, location: &str) -> std::result::Result<ResponseBody, TransferError> {
        let url = parse_replica_url(location)?;
        let response = self
            .transfer
            .perform(&TransferRequest::get(url), None)
            .await?
            .error_for_status()?;
        Ok(response.into_body())
    }

    async fn try_head(&self, location: &str) -> std::result::Result<Option<u64>, TransferError> {
        let url = parse_replica_url(location)?;
        let response = self
            .transfer
            .perform(&TransferRequest::head(url), None)
            .await?
            .error_for_status()?;
        Ok(response.content_length())
    }
}
