pub mod format;
pub mod snapshots;

pub use format::{format_age, format_size};
pub use snapshots::{DatabaseSummary, Snapshot, SnapshotStore};
