use tracing::{debug, warn};

use super::{BackupFormat, ProbeResult, SizeProbe, BYTES_PER_GB};
use crate::config::EstimateConfig;

/// Floor for any projected backup size.
pub const MIN_PROJECTED_GB: f64 = 0.1;

/// Data volume assumed for timeout planning when the probe gave nothing.
pub const UNKNOWN_SIZE_GB: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeEstimate {
    pub raw_bytes: Option<u64>,
    pub projected_gb: f64,
    pub format: BackupFormat,
}

impl SizeEstimate {
    pub fn raw_gb(&self) -> Option<f64> {
        self.raw_bytes.map(|b| b as f64 / BYTES_PER_GB)
    }

    /// Size handed to the timeout planner. Unknown (or zero) raw size is
    /// planned as [`UNKNOWN_SIZE_GB`] so a probe failure never shrinks the budget.
    pub fn planning_gb(&self) -> f64 {
        match self.raw_bytes {
            Some(bytes) if bytes > 0 => self.projected_gb,
            _ => self.projected_gb.max(UNKNOWN_SIZE_GB),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchEstimate {
    pub items: Vec<(String, SizeEstimate)>,
}

impl BatchEstimate {
    pub fn total_gb(&self) -> f64 {
        self.items.iter().map(|(_, e)| e.projected_gb).sum()
    }
}

#[derive(Debug, Clone)]
pub struct SizeEstimator {
    coefficients: EstimateConfig,
}

impl SizeEstimator {
    pub fn new(coefficients: EstimateConfig) -> Self {
        Self { coefficients }
    }

    /// `max(0.1, bytes / 2^30 * coefficient)`; unknown size counts as zero.
    pub fn estimate(&self, raw_bytes: Option<u64>, format: BackupFormat) -> SizeEstimate {
        let gb = raw_bytes.unwrap_or(0) as f64 / BYTES_PER_GB;
        let projected_gb = (gb * self.coefficients.coefficient(format)).max(MIN_PROJECTED_GB);
        SizeEstimate {
            raw_bytes,
            projected_gb,
            format,
        }
    }

    /// Estimate from a probe result. A missing database estimates like an
    /// unknown one; callers that care check the probe themselves.
    pub fn estimate_probed(&self, probe: &ProbeResult, format: BackupFormat) -> SizeEstimate {
        self.estimate(probe.bytes(), format)
    }

    /// Probes every name in order and collects the per-database estimates.
    pub fn estimate_batch<S: AsRef<str>>(
        &self,
        probe: &dyn SizeProbe,
        names: &[S],
        format: BackupFormat,
        mut on_estimate: impl FnMut(&str, &SizeEstimate),
    ) -> BatchEstimate {
        let mut batch = BatchEstimate::default();
        for name in names {
            let name = name.as_ref();
            let result = probe.probe(name);
            match &result {
                ProbeResult::NotFound => warn!("Database '{}' not found while estimating", name),
                ProbeResult::Failed(reason) => {
                    debug!("Size probe for '{}' failed: {}", name, reason)
                }
                ProbeResult::Bytes(_) => {}
            }
            let estimate = self.estimate_probed(&result, format);
            on_estimate(name, &estimate);
            batch.items.push((name.to_string(), estimate));
        }
        batch
    }
}
