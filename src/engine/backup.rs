use std::time::Duration;
use tracing::{info, warn};

use super::{run_batch, settle, BatchReport, OperationResult};
use crate::classify::ErrorCategory;
use crate::config::AppConfig;
use crate::estimate::{
    BackupFormat, ProbeResult, SizeEstimate, SizeEstimator, SizeProbe, TimeoutBudget,
    TimeoutPlanner, UNKNOWN_SIZE_GB,
};
use crate::exec::{ExecRequest, Executor};
use crate::interrupt::Interrupt;
use crate::progress::BatchReporter;

/// Probe → estimate → plan timeout → run the backup engine, per database.
pub struct BackupOrchestrator<'a> {
    config: &'a AppConfig,
    executor: &'a dyn Executor,
    probe: &'a dyn SizeProbe,
    reporter: &'a dyn BatchReporter,
    interrupt: Interrupt,
    estimator: SizeEstimator,
    planner: TimeoutPlanner,
}

impl<'a> BackupOrchestrator<'a> {
    pub fn new(
        config: &'a AppConfig,
        executor: &'a dyn Executor,
        probe: &'a dyn SizeProbe,
        reporter: &'a dyn BatchReporter,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            config,
            executor,
            probe,
            reporter,
            interrupt,
            estimator: SizeEstimator::new(config.estimates.clone()),
            planner: TimeoutPlanner::from_config(&config.timeouts),
        }
    }

    pub fn run<S: AsRef<str>>(&self, names: &[S], format: BackupFormat, dry_run: bool) -> BatchReport {
        info!(
            "Backing up {} database(s), format {}{}",
            names.len(),
            format,
            if dry_run { " (dry run)" } else { "" }
        );
        run_batch(names, self.reporter, &self.interrupt, |name| {
            self.backup_one(name, format, dry_run)
        })
    }

    pub fn backup_one(&self, name: &str, format: BackupFormat, dry_run: bool) -> OperationResult {
        let mut args = vec![
            "--ib".to_string(),
            name.to_string(),
            "--format".to_string(),
            format.as_arg().to_string(),
        ];

        let (estimate, timeout) = if dry_run {
            args.push("--dry-run".to_string());
            (None, TimeoutBudget::from_secs(self.config.timeouts.dry_run_secs))
        } else {
            let probed = self.probe.probe(name);
            if self.interrupt.is_triggered() {
                return OperationResult::interrupted(name);
            }
            if probed == ProbeResult::NotFound {
                warn!("Database '{}' does not exist, skipping backup", name);
                return OperationResult::failed(
                    name,
                    ErrorCategory::NotFound,
                    format!("Database '{}' does not exist", name),
                );
            }
            if let ProbeResult::Failed(reason) = &probed {
                warn!(
                    "Size of '{}' unknown ({}), planning for {} GB",
                    name, reason, UNKNOWN_SIZE_GB
                );
            }
            let estimate = self.estimator.estimate_probed(&probed, format);
            let timeout = self.planner.plan(estimate.planning_gb());
            (Some(estimate), timeout)
        };

        info!(
            "Backing up '{}' with a {} min timeout{}",
            name,
            timeout.minutes(),
            estimate
                .map(|e| format!(" (~{:.1} GB expected)", e.projected_gb))
                .unwrap_or_default()
        );

        let request = ExecRequest {
            operation: self.config.script_path(&self.config.paths.backup_script),
            args,
            timeout: timeout.as_duration(),
            run_as: Some(self.config.paths.backup_user.clone()),
            // Real backups stream progress straight to the terminal.
            capture_output: dry_run,
        };

        let execution = self.executor.execute(&request);
        settle(name, execution, |limit| timeout_message(name, estimate.as_ref(), limit))
            .with_plan(estimate, Some(timeout))
    }
}

fn timeout_message(name: &str, estimate: Option<&SizeEstimate>, limit: Duration) -> String {
    let size = match estimate.and_then(|e| e.raw_gb()) {
        Some(gb) if gb > 0.0 => format!(" (~{:.1} GB)", gb),
        _ => " (size unknown)".to_string(),
    };
    format!(
        "Backup of '{}'{} did not finish within {} min",
        name,
        size,
        limit.as_secs() / 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_with_size() {
        let estimate = SizeEstimate {
            raw_bytes: Some(3 << 30),
            projected_gb: 1.35,
            format: BackupFormat::Compact,
        };
        let msg = timeout_message("db1", Some(&estimate), Duration::from_secs(1200));
        assert_eq!(msg, "Backup of 'db1' (~3.0 GB) did not finish within 20 min");
    }

    #[test]
    fn test_timeout_message_unknown_size() {
        let msg = timeout_message("db1", None, Duration::from_secs(600));
        assert_eq!(msg, "Backup of 'db1' (size unknown) did not finish within 10 min");
    }
}
