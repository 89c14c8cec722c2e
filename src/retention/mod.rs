pub mod dates;
pub mod filter;
pub mod selection;

use thiserror::Error;

pub use filter::{DeletionScope, FilterState, Resolution, RetentionFilterEngine, SafetyDecision};
pub use selection::{SelectionInput, SelectionSpec};

/// Deletion criteria rejected before anything destructive is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("{0}")]
    Conflict(String),

    #[error("invalid date '{0}': expected YYYYMMDD, dd.mm.yyyy or dd.mm")]
    InvalidDate(String),

    #[error("invalid timestamp '{0}': expected YYYYMMDD_HHMMSS or 'dd.mm.yyyy HH:MM:SS'")]
    InvalidTimestamp(String),

    #[error("invalid range '{0}': expected START..END, e.g. 20260206..20260208")]
    InvalidRange(String),
}
