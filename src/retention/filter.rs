use std::fmt;

use super::SelectionSpec;

/// What a deletion applies to: one database or every database at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionScope {
    Database(String),
    All,
}

impl DeletionScope {
    pub fn label(&self) -> &str {
        match self {
            DeletionScope::Database(name) => name,
            DeletionScope::All => "ALL",
        }
    }

    fn engine_args(&self) -> Vec<String> {
        match self {
            DeletionScope::Database(name) => vec!["--ib".to_string(), name.clone()],
            DeletionScope::All => vec!["--all".to_string()],
        }
    }
}

impl fmt::Display for DeletionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl SafetyDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn block(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterState {
    Blocked,
    BoundedDelete(SelectionSpec),
    UnboundedDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub scope: DeletionScope,
    pub state: FilterState,
    pub decision: SafetyDecision,
    pub dry_run: bool,
    pub confirm: bool,
}

impl Resolution {
    /// Arguments for the rm engine, or `None` when the gate blocked the deletion.
    pub fn engine_args(&self) -> Option<Vec<String>> {
        let filter = match &self.state {
            FilterState::Blocked => return None,
            FilterState::BoundedDelete(spec) => spec.engine_args(),
            FilterState::UnboundedDelete => Vec::new(),
        };
        let mut args = self.scope.engine_args();
        args.extend(filter);
        if self.dry_run {
            args.push("--dry-run".to_string());
        }
        // The engine insists on --confirm even for a simulation.
        if self.confirm || self.dry_run {
            args.push("--confirm".to_string());
        }
        Some(args)
    }
}

/// Turns a selection into a filter plus the safety-gate decision.
///
/// The same gate applies to "everything of one database" and to the global
/// `ALL` scope: an unbounded deletion needs a dry run or explicit confirmation,
/// a bounded one always proceeds. Resolution is pure, so resolving the same
/// inputs twice yields the same decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionFilterEngine;

impl RetentionFilterEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(
        &self,
        scope: &DeletionScope,
        spec: &SelectionSpec,
        dry_run: bool,
        confirm: bool,
    ) -> Resolution {
        let (state, decision) = if spec.is_bounded() {
            (FilterState::BoundedDelete(spec.clone()), SafetyDecision::allow())
        } else if dry_run || confirm {
            (FilterState::UnboundedDelete, SafetyDecision::allow())
        } else {
            (FilterState::Blocked, SafetyDecision::block(blocked_reason(scope)))
        };

        Resolution {
            scope: scope.clone(),
            state,
            decision,
            dry_run,
            confirm,
        }
    }
}

fn blocked_reason(scope: &DeletionScope) -> String {
    match scope {
        DeletionScope::Database(name) => format!(
            "--confirm is required to delete ALL backups of database '{}'",
            name
        ),
        DeletionScope::All => {
            "--confirm is required to delete ALL backups of ALL databases (global operation)"
                .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ib() -> DeletionScope {
        DeletionScope::Database("ib".to_string())
    }

    #[test]
    fn test_unrestricted_blocked_without_confirmation() {
        let r = RetentionFilterEngine::new().resolve(&ib(), &SelectionSpec::Unrestricted, false, false);
        assert!(!r.decision.allowed);
        assert_eq!(r.state, FilterState::Blocked);
        assert!(r.decision.reason.as_deref().unwrap().contains("'ib'"));
        assert!(r.engine_args().is_none());
    }

    #[test]
    fn test_unrestricted_allowed_in_dry_run() {
        let r = RetentionFilterEngine::new().resolve(&ib(), &SelectionSpec::Unrestricted, true, false);
        assert!(r.decision.allowed);
        assert_eq!(r.state, FilterState::UnboundedDelete);
        assert_eq!(
            r.engine_args().unwrap(),
            vec!["--ib", "ib", "--dry-run", "--confirm"]
        );
    }

    #[test]
    fn test_unrestricted_allowed_with_confirm() {
        let r = RetentionFilterEngine::new().resolve(&ib(), &SelectionSpec::Unrestricted, false, true);
        assert!(r.decision.allowed);
        assert_eq!(r.engine_args().unwrap(), vec!["--ib", "ib", "--confirm"]);
    }

    #[test]
    fn test_exact_never_needs_confirmation() {
        let spec = SelectionSpec::Exact("20260208_183432".to_string());
        let r = RetentionFilterEngine::new().resolve(&ib(), &spec, false, false);
        assert!(r.decision.allowed);
        assert_eq!(r.state, FilterState::BoundedDelete(spec));
        assert_eq!(
            r.engine_args().unwrap(),
            vec!["--ib", "ib", "--timestamp", "20260208_183432"]
        );
    }

    #[test]
    fn test_inverted_range_forwarded_unchanged() {
        let spec = SelectionSpec::Range {
            after: "20260210".to_string(),
            before: "20260201".to_string(),
        };
        let r = RetentionFilterEngine::new().resolve(&ib(), &spec, false, false);
        assert!(r.decision.allowed);
        assert_eq!(
            r.engine_args().unwrap(),
            vec!["--ib", "ib", "--after", "20260210", "--before", "20260201"]
        );
    }

    #[test]
    fn test_global_scope_uses_same_gate() {
        let engine = RetentionFilterEngine::new();
        let blocked = engine.resolve(&DeletionScope::All, &SelectionSpec::Unrestricted, false, false);
        assert!(!blocked.decision.allowed);
        assert!(blocked.decision.reason.unwrap().contains("global"));

        let dry = engine.resolve(&DeletionScope::All, &SelectionSpec::Unrestricted, true, false);
        assert_eq!(dry.engine_args().unwrap(), vec!["--all", "--dry-run", "--confirm"]);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let engine = RetentionFilterEngine::new();
        for (dry, confirm) in [(false, false), (true, false), (false, true), (true, true)] {
            let a = engine.resolve(&ib(), &SelectionSpec::Unrestricted, dry, confirm);
            let b = engine.resolve(&ib(), &SelectionSpec::Unrestricted, dry, confirm);
            assert_eq!(a, b);
        }
    }
}
