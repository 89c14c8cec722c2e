#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use backup_warden::estimate::{ProbeResult, SizeProbe, BYTES_PER_GB};
use backup_warden::exec::{ExecError, ExecRequest, Executor, OperationOutcome};
use backup_warden::preflight::{DiskUsage, FreeSpace};

pub fn gb(value: f64) -> u64 {
    (value * BYTES_PER_GB) as u64
}

/// Records every request and answers from a per-database script.
#[derive(Default)]
pub struct FakeExecutor {
    pub requests: RefCell<Vec<ExecRequest>>,
    responses: HashMap<String, Result<OperationOutcome, FakeError>>,
}

#[derive(Clone, Copy)]
pub enum FakeError {
    TimedOut,
    Interrupted,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, target: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses.insert(
            target.to_string(),
            Ok(OperationOutcome::from_exit(exit_code, stdout.to_string(), stderr.to_string())),
        );
        self
    }

    pub fn fail_with(mut self, target: &str, error: FakeError) -> Self {
        self.responses.insert(target.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn request(&self, index: usize) -> ExecRequest {
        self.requests.borrow()[index].clone()
    }

    /// Value following `--ib`, or `ALL` for a global request.
    fn target_of(request: &ExecRequest) -> String {
        request
            .args
            .iter()
            .position(|a| a == "--ib")
            .and_then(|i| request.args.get(i + 1).cloned())
            .unwrap_or_else(|| "ALL".to_string())
    }
}

impl Executor for FakeExecutor {
    fn execute(&self, request: &ExecRequest) -> Result<OperationOutcome, ExecError> {
        self.requests.borrow_mut().push(request.clone());
        match self.responses.get(&Self::target_of(request)) {
            Some(Ok(outcome)) => Ok(outcome.clone()),
            Some(Err(FakeError::TimedOut)) => Err(ExecError::TimedOut(request.timeout)),
            Some(Err(FakeError::Interrupted)) => Err(ExecError::Interrupted),
            None => Ok(OperationOutcome::from_exit(0, "done".to_string(), String::new())),
        }
    }
}

#[derive(Default)]
pub struct FakeProbe {
    sizes: HashMap<String, ProbeResult>,
    pub probed: RefCell<Vec<String>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, database: &str, result: ProbeResult) -> Self {
        self.sizes.insert(database.to_string(), result);
        self
    }
}

impl SizeProbe for FakeProbe {
    fn probe(&self, database: &str) -> ProbeResult {
        self.probed.borrow_mut().push(database.to_string());
        self.sizes
            .get(database)
            .cloned()
            .unwrap_or_else(|| ProbeResult::Failed("no size configured".to_string()))
    }
}

pub struct FakeFreeSpace {
    pub free_bytes: Option<u64>,
    pub queried: RefCell<Vec<PathBuf>>,
}

impl FakeFreeSpace {
    pub fn new(free_bytes: u64) -> Self {
        Self {
            free_bytes: Some(free_bytes),
            queried: RefCell::new(Vec::new()),
        }
    }

    pub fn unreadable() -> Self {
        Self {
            free_bytes: None,
            queried: RefCell::new(Vec::new()),
        }
    }
}

impl FreeSpace for FakeFreeSpace {
    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage> {
        self.queried.borrow_mut().push(path.to_path_buf());
        match self.free_bytes {
            Some(free) => Ok(DiskUsage {
                total_bytes: free * 2,
                used_bytes: free,
                free_bytes: free,
            }),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such volume")),
        }
    }
}
