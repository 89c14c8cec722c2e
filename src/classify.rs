//! Maps failed external operations onto a fixed error taxonomy.
//!
//! Classification is plain case-insensitive substring matching over the
//! diagnostic text of an [`OperationOutcome`]. Categories are checked in the
//! order of [`RULES`] and the first match wins.

use std::fmt;

use crate::exec::OperationOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    PermissionDenied,
    Timeout,
    InsufficientSpace,
    ConnectivityFailure,
    AuthFailure,
    Unclassified,
}

impl ErrorCategory {
    pub fn hint(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => {
                "Check the database name and refresh the database list (ib_list.conf)"
            }
            ErrorCategory::PermissionDenied => {
                "Check sudo rules and file ownership for the backup user"
            }
            ErrorCategory::Timeout => {
                "Raise timeouts.minutes_per_gb for large databases or check disk/network throughput"
            }
            ErrorCategory::InsufficientSpace => {
                "Free space in the backup root or delete old snapshots first"
            }
            ErrorCategory::ConnectivityFailure => {
                "Check that the database server is reachable (host, port, firewall)"
            }
            ErrorCategory::AuthFailure => {
                "Check credentials in the backup user's .pgpass and pg_hba.conf"
            }
            ErrorCategory::Unclassified => "See the log file for the full diagnostic output",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "not found",
            ErrorCategory::PermissionDenied => "permission denied",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::InsufficientSpace => "insufficient space",
            ErrorCategory::ConnectivityFailure => "connectivity failure",
            ErrorCategory::AuthFailure => "authentication failure",
            ErrorCategory::Unclassified => "error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Phrases are lowercase; matching lowercases the haystack.
const RULES: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::NotFound,
        &["does not exist", "not found", "no such file", "не найден", "не существует"],
    ),
    (
        ErrorCategory::PermissionDenied,
        &[
            "permission denied",
            "operation not permitted",
            "is not in the sudoers file",
            "отказано в доступе",
        ],
    ),
    (
        ErrorCategory::InsufficientSpace,
        &[
            "no space left on device",
            "disk full",
            "could not extend file",
            "недостаточно места",
        ],
    ),
    (
        ErrorCategory::ConnectivityFailure,
        &[
            "could not connect",
            "connection refused",
            "connection timed out",
            "timeout expired",
            "timed out",
            "network is unreachable",
            "no route to host",
            "server closed the connection",
        ],
    ),
    (
        ErrorCategory::AuthFailure,
        &[
            "password authentication failed",
            "authentication failed",
            "no password supplied",
            "pg_hba.conf",
        ],
    ),
];

/// A classified failure: category plus the message to show an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub message: String,
}

impl Classification {
    pub fn hint(&self) -> &'static str {
        self.category.hint()
    }
}

pub fn classify(outcome: &OperationOutcome) -> Classification {
    classify_text(&outcome.stderr, &outcome.stdout)
}

pub fn classify_text(stderr: &str, stdout: &str) -> Classification {
    let haystack = format!("{}\n{}", stderr, stdout).to_lowercase();
    let diagnostic = diagnostic_text(stderr, stdout);

    for (category, phrases) in RULES {
        if phrases.iter().any(|p| haystack.contains(p)) {
            return Classification {
                category: *category,
                message: diagnostic.trim().to_string(),
            };
        }
    }

    Classification {
        category: ErrorCategory::Unclassified,
        message: first_line(diagnostic),
    }
}

fn diagnostic_text<'a>(stderr: &'a str, stdout: &'a str) -> &'a str {
    if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown error")
        .to_string()
}
