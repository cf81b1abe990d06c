pub mod rides;
pub mod snapshot;
pub mod snapshot_copier;

pub use rides::{RecentRideRequest, RideRequest};
pub use snapshot::CopierSnapshot;
pub use snapshot_copier::{CopyReport, SnapshotCopier};
