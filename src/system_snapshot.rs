use serde::Serialize;
use crate::copier::CopierSnapshot;
use crate::expiry::SweeperSnapshot;

#[derive(Serialize)]
pub struct SystemSnapshot {
    pub uptime_seconds: u64,
    pub server_time: String,
    pub copier: CopierSnapshot,
    pub sweeper: Option<SweeperSnapshot>,
    pub collections: CollectionsSnapshot,
}

#[derive(Serialize)]
pub struct CollectionsSnapshot {
    pub source: CollectionSize,
    pub recent: CollectionSize,
}

#[derive(Serialize)]
pub struct CollectionSize {
    pub name: String,
    pub documents: Option<usize>, // None when the store could not be read
}
