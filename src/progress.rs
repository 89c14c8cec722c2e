use crate::engine::{BatchReport, OperationResult};
use crate::estimate::SizeEstimate;

/// Trait for reporting batch progress.
///
/// The CLI implements it with colored output and spinners, tests and library
/// callers use [`SilentReporter`]. All methods have default no-op implementations.
pub trait BatchReporter {
    fn on_estimate_start(&self, _total: usize) {}
    fn on_estimate(&self, _database: &str, _estimate: &SizeEstimate) {}
    fn on_estimate_complete(&self) {}
    fn on_batch_start(&self, _total: usize) {}
    fn on_item_start(&self, _index: usize, _total: usize, _target: &str) {}
    fn on_item_complete(&self, _index: usize, _total: usize, _result: &OperationResult) {}
    fn on_batch_complete(&self, _report: &BatchReport) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl BatchReporter for SilentReporter {}
