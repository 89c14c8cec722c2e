use std::time::Duration;
use tracing::{info, warn};

use super::{run_batch, settle, BatchReport, OperationResult};
use crate::classify::ErrorCategory;
use crate::config::AppConfig;
use crate::exec::{ExecRequest, Executor};
use crate::interrupt::Interrupt;
use crate::progress::BatchReporter;
use crate::retention::{DeletionScope, RetentionFilterEngine, SelectionSpec};
use crate::storage::SnapshotStore;

/// Gate → rm engine, per database or once for every database.
pub struct DeletionOrchestrator<'a> {
    config: &'a AppConfig,
    executor: &'a dyn Executor,
    store: &'a SnapshotStore,
    reporter: &'a dyn BatchReporter,
    interrupt: Interrupt,
    engine: RetentionFilterEngine,
}

impl<'a> DeletionOrchestrator<'a> {
    pub fn new(
        config: &'a AppConfig,
        executor: &'a dyn Executor,
        store: &'a SnapshotStore,
        reporter: &'a dyn BatchReporter,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            config,
            executor,
            store,
            reporter,
            interrupt,
            engine: RetentionFilterEngine::new(),
        }
    }

    pub fn run<S: AsRef<str>>(
        &self,
        names: &[S],
        spec: &SelectionSpec,
        dry_run: bool,
        confirm: bool,
    ) -> BatchReport {
        info!(
            "Deleting {} of {} database(s){}",
            spec.describe(),
            names.len(),
            if dry_run { " (dry run)" } else { "" }
        );
        run_batch(names, self.reporter, &self.interrupt, |name| {
            self.delete_scoped(&DeletionScope::Database(name.to_string()), spec, dry_run, confirm)
        })
    }

    /// Global deletion of every snapshot of every database.
    pub fn run_all(&self, dry_run: bool, confirm: bool) -> BatchReport {
        warn!("Global deletion requested for ALL databases");
        let scope = DeletionScope::All;
        run_batch(&[scope.label()], self.reporter, &self.interrupt, |_| {
            self.delete_scoped(&scope, &SelectionSpec::Unrestricted, dry_run, confirm)
        })
    }

    fn delete_scoped(
        &self,
        scope: &DeletionScope,
        spec: &SelectionSpec,
        dry_run: bool,
        confirm: bool,
    ) -> OperationResult {
        let target = scope.label();

        if let DeletionScope::Database(name) = scope {
            if !self.store.has_database(name) {
                return OperationResult::failed(
                    target,
                    ErrorCategory::NotFound,
                    format!(
                        "Database '{}' not found in backup storage ({})",
                        name,
                        self.store.database_dir(name).display()
                    ),
                );
            }
        }

        let resolution = self.engine.resolve(scope, spec, dry_run, confirm);
        let Some(args) = resolution.engine_args() else {
            let reason = resolution
                .decision
                .reason
                .unwrap_or_else(|| "deletion blocked".to_string());
            warn!("Deletion for '{}' blocked: {}", target, reason);
            return OperationResult::blocked(target, reason);
        };

        let timeout_secs = match scope {
            DeletionScope::Database(_) => self.config.timeouts.delete_secs,
            DeletionScope::All => self.config.timeouts.delete_all_secs,
        };
        let request = ExecRequest {
            operation: self.config.script_path(&self.config.paths.rm_script),
            args,
            timeout: Duration::from_secs(timeout_secs),
            run_as: Some(self.config.paths.backup_user.clone()),
            capture_output: true,
        };

        let execution = self.executor.execute(&request);
        settle(target, execution, |limit| {
            format!(
                "Deleting {} of '{}' did not finish within {} min",
                spec.describe(),
                target,
                limit.as_secs() / 60
            )
        })
    }
}
