pub mod probe;
pub mod size;
pub mod timeout;

use std::fmt;

pub use probe::{ProbeResult, PsqlSizeProbe, SizeProbe};
pub use size::{BatchEstimate, SizeEstimate, SizeEstimator, MIN_PROJECTED_GB, UNKNOWN_SIZE_GB};
pub use timeout::{TimeoutBudget, TimeoutPlanner};

pub const BYTES_PER_GB: f64 = (1u64 << 30) as f64;

/// Output format of the backup engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackupFormat {
    /// Binary dump (`pg_dump -Fc`)
    #[value(name = "dump")]
    Compact,
    /// Gzipped plain SQL
    #[value(name = "sql")]
    TextCompressed,
}

impl BackupFormat {
    /// Value passed to the engine's `--format`.
    pub fn as_arg(&self) -> &'static str {
        match self {
            BackupFormat::Compact => "dump",
            BackupFormat::TextCompressed => "sql",
        }
    }
}

impl fmt::Display for BackupFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}
