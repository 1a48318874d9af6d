//! Replica locations decoded from tracker replies.

use mogile_http::Replica;

use crate::tracker::{TrackerError, TrackerResponse};

/// Ordered read locations for one key, as returned by `get_paths`.
///
/// The reply carries `paths=N` and `path1..pathN`; the order is the
/// tracker's preference and is kept as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicaSet {
    locations: Vec<String>,
}

impl ReplicaSet {
    pub fn from_get_paths(response: &TrackerResponse) -> Result<Self, TrackerError> {
        let count = response.get_u64("paths")?.unwrap_or(0);
        let locations = (1..=count)
            .map(|i| response.require(&format!("path{i}")).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { locations })
    }

    pub fn locations(&self) -> &[String] { &self.locations }

    pub fn len(&self) -> usize { self.locations.len() }

    pub fn is_empty(&self) -> bool { self.locations.is_empty() }

    pub fn into_locations(self) -> Vec<String> { self.locations }
}

/// Destinations allocated by `create_open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    /// File id to hand back on `create_close`; absent when the tracker
    /// did not report one.
    pub fid:      Option<u64>,
    pub replicas: Vec<Replica>,
}

impl WritePlan {
    /// Decode either the multi-destination form (`dev_count`, `devid_i`,
    /// `path_i`) or the single form (`devid`, `path`).
    pub fn from_create_open(response: &TrackerResponse) -> Result<Self, TrackerError> {
        let fid = response.get_u64("fid")?;
        let replicas = match response.get_u64("dev_count")? {
            Some(count) => (1..=count)
                .map(|i| replica(response, &format!("devid_{i}"), &format!("path_{i}")))
                .collect::<Result<Vec<_>, _>>()?,
            None if response.get("path").is_some() => vec![replica(response, "devid", "path")?],
            None => Vec::new(),
        };
        Ok(Self { fid, replicas })
    }
}

fn replica(response: &TrackerResponse, devid: &str, path: &str) -> Result<Replica, TrackerError> {
    let id = response
        .get_u64(devid)?
        .ok_or_else(|| TrackerError::MalformedResponse(format!("missing field {devid:?}")))?;
    Ok(Replica::new(id, response.require(path)?))
}
