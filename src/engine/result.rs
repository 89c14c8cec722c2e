use std::time::Duration;

use crate::classify::{Classification, ErrorCategory};
use crate::estimate::{SizeEstimate, TimeoutBudget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Succeeded,
    Failed,
    /// Stopped by the safety gate before anything ran.
    Blocked,
    Interrupted,
}

/// Outcome of one backup or deletion, shared by both orchestrators.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub target: String,
    pub status: ResultStatus,
    pub category: Option<ErrorCategory>,
    pub message: String,
    pub estimate: Option<SizeEstimate>,
    pub timeout: Option<TimeoutBudget>,
}

impl OperationResult {
    fn new(target: &str, status: ResultStatus, category: Option<ErrorCategory>, message: String) -> Self {
        Self {
            target: target.to_string(),
            status,
            category,
            message,
            estimate: None,
            timeout: None,
        }
    }

    pub fn succeeded(target: &str, message: impl Into<String>) -> Self {
        Self::new(target, ResultStatus::Succeeded, None, message.into())
    }

    pub fn failed(target: &str, category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::new(target, ResultStatus::Failed, Some(category), message.into())
    }

    pub fn classified(target: &str, classification: Classification) -> Self {
        Self::failed(target, classification.category, classification.message)
    }

    pub fn blocked(target: &str, reason: impl Into<String>) -> Self {
        Self::new(target, ResultStatus::Blocked, None, reason.into())
    }

    pub fn interrupted(target: &str) -> Self {
        Self::new(
            target,
            ResultStatus::Interrupted,
            None,
            "Operation interrupted by user".to_string(),
        )
    }

    pub fn with_plan(mut self, estimate: Option<SizeEstimate>, timeout: Option<TimeoutBudget>) -> Self {
        self.estimate = estimate;
        self.timeout = timeout;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Succeeded
    }

    pub fn hint(&self) -> Option<&'static str> {
        self.category.map(|c| c.hint())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<OperationResult>,
    /// Targets never attempted because the batch was interrupted.
    pub skipped: Vec<String>,
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.results.len() + self.skipped.len()
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.succeeded_count()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.interrupted && self.skipped.is_empty() && self.failed_count() == 0
    }

    /// 0 when everything succeeded, 130 when interrupted, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            130
        } else if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    pub fn result_for(&self, target: &str) -> Option<&OperationResult> {
        self.results.iter().find(|r| r.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_exit_code() {
        let report = BatchReport {
            results: vec![
                OperationResult::succeeded("a", ""),
                OperationResult::failed("b", ErrorCategory::NotFound, "gone"),
                OperationResult::blocked("c", "needs --confirm"),
            ],
            ..Default::default()
        };
        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_interrupted_exit_code() {
        let report = BatchReport {
            results: vec![OperationResult::interrupted("a")],
            skipped: vec!["b".to_string()],
            interrupted: true,
            ..Default::default()
        };
        assert_eq!(report.total(), 2);
        assert_eq!(report.exit_code(), 130);
    }

    #[test]
    fn test_hint_follows_category() {
        let r = OperationResult::failed("a", ErrorCategory::AuthFailure, "bad password");
        assert_eq!(r.hint(), Some(ErrorCategory::AuthFailure.hint()));
        assert_eq!(OperationResult::succeeded("a", "").hint(), None);
    }
}
