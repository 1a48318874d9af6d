use tracing::{debug, info};

use super::http::HttpTransfer;
use super::source::{ContentSource, pump_body};
use crate::data::{Replica, TransferRequest, parse_replica_url};
use crate::error::{Error, ReplicaFailure, Result, TransferError};

/// Writes one payload to every replica of a key.
///
/// All replicas must accept the bytes: a single failure fails the whole
/// write and no further replica is attempted. The content is produced once
/// and fanned out chunk by chunk, so a callback producer runs exactly once.
#[derive(Debug, Clone, Default)]
pub struct ReplicatedWriter {
    transfer: HttpTransfer,
}

impl ReplicatedWriter {
    pub fn new(transfer: HttpTransfer) -> Self { Self { transfer } }

    /// Store `source` on all `replicas`, returning the declared length.
    pub async fn write(&self, key: &str, replicas: &[Replica], source: ContentSource) -> Result<u64> {
        if replicas.is_empty() {
            return Err(Error::NoReplicas { key: key.to_string() });
        }

        // every location must be reachable before any byte goes out
        let urls = replicas
            .iter()
            .map(|replica| parse_replica_url(&replica.location))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let declared = source.length();
        let failed = |index: usize, error: TransferError| Error::StoreFailed {
            key:     key.to_string(),
            failure: ReplicaFailure {
                url: replicas[index].location.clone(),
                error,
            },
        };

        let mut conns = Vec::with_capacity(urls.len());
        for (index, url) in urls.into_iter().enumerate() {
            let conn = self
                .transfer
                .open(&TransferRequest::put(url, declared))
                .await
                .map_err(|e| failed(index, e))?;
            conns.push(conn);
        }

        let chunks = source.into_chunks(self.transfer.options().chunk_size);
        if let Err(err) = pump_body(&mut conns, chunks, declared).await {
            return Err(match err.replica {
                Some(index) => failed(index, err.error),
                None => Error::Transfer(err.error),
            });
        }

        for (index, conn) in conns.into_iter().enumerate() {
            let response = conn
                .finish()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(|e| failed(index, e))?;
            debug!(
                key,
                devid = replicas[index].devid,
                status = response.status(),
                "replica accepted content"
            );
        }

        info!(key, bytes = declared, replicas = replicas.len(), "stored content");
        Ok(declared)
    }
}
