//! Capacity check run before committing to a batch of backups.

pub mod free_space;

use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::estimate::{BackupFormat, SizeEstimate, SizeEstimator, SizeProbe, BYTES_PER_GB};
pub use free_space::{DfFreeSpace, DiskUsage, FreeSpace};

#[derive(Debug, Clone, PartialEq)]
pub struct CapacityReport {
    pub database_count: usize,
    pub required_gb: f64,
    pub free_gb: f64,
    pub margin_gb: f64,
    pub sufficient: bool,
    pub shortage_gb: f64,
    pub breakdown: Vec<(String, SizeEstimate)>,
}

impl CapacityReport {
    /// `required_gb` already includes the margin.
    pub fn new(
        required_gb: f64,
        free_gb: f64,
        margin_gb: f64,
        breakdown: Vec<(String, SizeEstimate)>,
    ) -> Self {
        let shortage_gb = (required_gb - free_gb).max(0.0);
        Self {
            database_count: breakdown.len(),
            required_gb,
            free_gb,
            margin_gb,
            sufficient: shortage_gb == 0.0,
            shortage_gb,
            breakdown,
        }
    }
}

impl fmt::Display for CapacityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sufficient {
            writeln!(f, "Enough space to back up {} database(s):", self.database_count)?;
        } else {
            writeln!(f, "NOT enough space to back up {} database(s):", self.database_count)?;
        }
        writeln!(
            f,
            "   Required:  {:.1} GB (including {:.1} GB margin)",
            self.required_gb, self.margin_gb
        )?;
        write!(f, "   Free:      {:.1} GB", self.free_gb)?;
        if !self.sufficient {
            write!(f, "\n   Shortfall: {:.1} GB", self.shortage_gb)?;
        }
        Ok(())
    }
}

pub struct CapacityPreflight<'a> {
    estimator: &'a SizeEstimator,
    probe: &'a dyn SizeProbe,
    free_space: &'a dyn FreeSpace,
    backup_root: PathBuf,
}

impl<'a> CapacityPreflight<'a> {
    pub fn new(
        estimator: &'a SizeEstimator,
        probe: &'a dyn SizeProbe,
        free_space: &'a dyn FreeSpace,
        backup_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            estimator,
            probe,
            free_space,
            backup_root: backup_root.into(),
        }
    }

    pub fn check<S: AsRef<str>>(
        &self,
        names: &[S],
        format: BackupFormat,
        safety_margin_gb: f64,
    ) -> CapacityReport {
        self.check_with(names, format, safety_margin_gb, |_, _| {})
    }

    /// Same as [`check`](Self::check), calling `on_estimate` after each probe.
    pub fn check_with<S: AsRef<str>>(
        &self,
        names: &[S],
        format: BackupFormat,
        safety_margin_gb: f64,
        on_estimate: impl FnMut(&str, &SizeEstimate),
    ) -> CapacityReport {
        let batch = self
            .estimator
            .estimate_batch(self.probe, names, format, on_estimate);
        let required_gb = batch.total_gb() + safety_margin_gb;
        let free_gb = self.free_gb();

        let report = CapacityReport::new(required_gb, free_gb, safety_margin_gb, batch.items);
        if report.sufficient {
            info!(
                "Preflight ok: {:.1} GB required, {:.1} GB free",
                report.required_gb, report.free_gb
            );
        } else {
            warn!(
                "Preflight failed: {:.1} GB required, {:.1} GB free, {:.1} GB short",
                report.required_gb, report.free_gb, report.shortage_gb
            );
        }
        report
    }

    /// Free space on the backup root; an unreadable volume counts as full.
    fn free_gb(&self) -> f64 {
        match self.free_space.disk_usage(&self.backup_root) {
            Ok(usage) => usage.free_bytes as f64 / BYTES_PER_GB,
            Err(e) => {
                warn!(
                    "Could not read free space for {}: {}",
                    self.backup_root.display(),
                    e
                );
                0.0
            }
        }
    }
}
