//! Sequential batch orchestration for backups and deletions.
//!
//! Both orchestrators walk their targets strictly one after another. A failure
//! is captured in that target's [`OperationResult`] and never stops the batch;
//! only an interrupt does, in which case the remaining targets are listed as
//! skipped.

pub mod backup;
pub mod delete;
pub mod result;

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::classify::{classify, classify_text, ErrorCategory};
use crate::exec::{ExecError, OperationOutcome};
use crate::interrupt::Interrupt;
use crate::progress::BatchReporter;

pub use backup::BackupOrchestrator;
pub use delete::DeletionOrchestrator;
pub use result::{BatchReport, OperationResult, ResultStatus};

fn run_batch<S: AsRef<str>>(
    targets: &[S],
    reporter: &dyn BatchReporter,
    interrupt: &Interrupt,
    mut operation: impl FnMut(&str) -> OperationResult,
) -> BatchReport {
    let started = Instant::now();
    let total = targets.len();
    let mut report = BatchReport::default();
    reporter.on_batch_start(total);

    for (index, target) in targets.iter().enumerate() {
        let target = target.as_ref();
        if interrupt.is_triggered() {
            report.interrupted = true;
            report.skipped = remaining(targets, index);
            break;
        }

        reporter.on_item_start(index + 1, total, target);
        let result = operation(target);
        reporter.on_item_complete(index + 1, total, &result);

        let stop = result.status == ResultStatus::Interrupted;
        report.results.push(result);
        if stop {
            report.interrupted = true;
            report.skipped = remaining(targets, index + 1);
            break;
        }
    }

    report.elapsed = started.elapsed();
    if report.interrupted {
        warn!(
            "Batch interrupted: {} done, {} skipped",
            report.results.len(),
            report.skipped.len()
        );
    }
    info!(
        "Batch finished: {}/{} succeeded in {:.2}s",
        report.succeeded_count(),
        report.total(),
        report.elapsed.as_secs_f64()
    );
    reporter.on_batch_complete(&report);
    report
}

fn remaining<S: AsRef<str>>(targets: &[S], from: usize) -> Vec<String> {
    targets[from..]
        .iter()
        .map(|t| t.as_ref().to_string())
        .collect()
}

/// Turns an execution attempt into a result record. `timeout_message` builds
/// the operator message for a killed-on-timeout run.
fn settle(
    target: &str,
    execution: Result<OperationOutcome, ExecError>,
    timeout_message: impl FnOnce(Duration) -> String,
) -> OperationResult {
    match execution {
        Ok(outcome) if outcome.succeeded => OperationResult::succeeded(target, outcome.output()),
        Ok(outcome) => {
            let classification = classify(&outcome);
            warn!(
                "'{}' failed with exit code {} ({})",
                target, outcome.exit_code, classification.category
            );
            OperationResult::classified(target, classification)
        }
        Err(ExecError::TimedOut(limit)) => {
            OperationResult::failed(target, ErrorCategory::Timeout, timeout_message(limit))
        }
        Err(ExecError::Interrupted) => OperationResult::interrupted(target),
        Err(e) => OperationResult::classified(target, classify_text(&e.to_string(), "")),
    }
}
