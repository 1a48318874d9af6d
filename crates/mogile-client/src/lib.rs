//! Key-based client for MogileFS.
//!
//! # Architecture
//!
//! - [`Tracker`] - boundary to the metadata service; [`ScriptedTracker`]
//!   replays canned replies
//! - [`ReplicaSet`] / [`WritePlan`] - tracker replies decoded into replica
//!   locations
//! - [`MogileClient`] - the key-level facade: resolve through the tracker,
//!   then read or write through `mogile-http`
//!
//! A client built with `readonly = true` refuses every mutating call
//! locally, before any tracker or storage traffic.

mod client;
mod config;
mod error;
mod listing;
mod replicas;
mod tracker;

pub use client::MogileClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use listing::KeyPage;
pub use mogile_http::{ContentSink, ContentSource, Replica, ResponseBody, TransferOptions};
pub use replicas::{ReplicaSet, WritePlan};
pub use tracker::{ScriptedTracker, Tracker, TrackerCall, TrackerError, TrackerResponse};
