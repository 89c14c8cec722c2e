use tracing::error;

use super::{run_command, CommandSpec, ExecError, ExecRequest, Executor, OperationOutcome};
use crate::interrupt::Interrupt;

/// Runs engine scripts through `sudo -u <user>`.
pub struct ScriptExecutor {
    interrupt: Interrupt,
}

impl ScriptExecutor {
    pub fn new(interrupt: Interrupt) -> Self {
        Self { interrupt }
    }
}

impl Executor for ScriptExecutor {
    fn execute(&self, request: &ExecRequest) -> Result<OperationOutcome, ExecError> {
        if !request.operation.is_file() {
            error!("Engine script not found: {}", request.operation.display());
            return Ok(OperationOutcome::failed(format!(
                "Script not found: {}",
                request.operation.display()
            )));
        }

        let spec = CommandSpec {
            program: request.operation.clone(),
            args: request.args.clone(),
            env: Vec::new(),
            run_as: request.run_as.clone(),
            set_home: false,
            timeout: request.timeout,
            capture_output: request.capture_output,
        };
        run_command(&spec, &self.interrupt)
    }
}
