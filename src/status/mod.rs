mod client;

use std::future::Future;

use crate::error::Result;
use crate::model::Snapshot;

pub use client::StatusClient;

/// Source of flow snapshots polled by the watcher.
pub trait SnapshotSource {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot>>;
}
