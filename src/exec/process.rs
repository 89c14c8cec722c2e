use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{ExecError, OperationOutcome};
use crate::interrupt::Interrupt;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Time between SIGTERM and SIGKILL when stopping a command's process group.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// A fully resolved command line plus the limits it runs under.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub run_as: Option<String>,
    /// Pass `-H` to sudo so the target user's home is used.
    pub set_home: bool,
    pub timeout: Duration,
    pub capture_output: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            run_as: None,
            set_home: false,
            timeout,
            capture_output: true,
        }
    }

    fn to_command(&self) -> Command {
        let mut cmd = match &self.run_as {
            Some(user) => {
                let mut cmd = Command::new("sudo");
                cmd.arg("-u").arg(user);
                if self.set_home {
                    cmd.arg("-H");
                }
                cmd.arg(&self.program);
                cmd
            }
            None => Command::new(&self.program),
        };
        cmd.args(&self.args);
        cmd.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if self.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        cmd.stdin(Stdio::null());
        // Own process group, so a timeout can stop sudo and everything it started.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }
}

/// Runs a command to completion, killing it on timeout or interrupt.
pub fn run_command(spec: &CommandSpec, interrupt: &Interrupt) -> Result<OperationOutcome, ExecError> {
    debug!(
        "Running {} {:?} (timeout {} s, user {:?})",
        spec.program.display(),
        spec.args,
        spec.timeout.as_secs(),
        spec.run_as
    );

    let mut child = spec.to_command().spawn().map_err(|source| ExecError::Spawn {
        program: spec.program.display().to_string(),
        source,
    })?;

    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if interrupt.is_triggered() {
            terminate(&mut child);
            return Err(ExecError::Interrupted);
        }
        if started.elapsed() >= spec.timeout {
            warn!(
                "{} exceeded {} s, killing it",
                spec.program.display(),
                spec.timeout.as_secs()
            );
            terminate(&mut child);
            return Err(ExecError::TimedOut(spec.timeout));
        }
        thread::sleep(POLL_INTERVAL);
    };

    // The interrupt may land between the last poll and the exit.
    if interrupt.is_triggered() {
        return Err(ExecError::Interrupted);
    }

    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);
    let exit_code = status.code().unwrap_or(-1);
    debug!(
        "{} exited with {} after {:.2}s",
        spec.program.display(),
        exit_code,
        started.elapsed().as_secs_f64()
    );

    Ok(OperationOutcome::from_exit(exit_code, stdout, stderr))
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Stops the child's whole process group: SIGTERM first, which sudo relays to
/// the command it runs, then SIGKILL for anything still alive.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let group = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(group, Signal::SIGTERM) {
        debug!("SIGTERM to process group {} failed: {}", group, e);
    }

    let deadline = Instant::now() + KILL_GRACE;
    while Instant::now() < deadline {
        if let Ok(Some(_)) = child.try_wait() {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    // The leader may be gone while its background children live on.
    if let Err(e) = killpg(group, Signal::SIGKILL) {
        debug!("SIGKILL to process group {} failed: {}", group, e);
    }
    if let Err(e) = child.wait() {
        warn!("Failed to reap process {}: {}", child.id(), e);
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("Failed to kill process {}: {}", child.id(), e);
    }
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> CommandSpec {
        let mut spec = CommandSpec::new("/bin/sh", timeout);
        spec.args = vec!["-c".to_string(), script.to_string()];
        spec
    }

    #[test]
    fn test_captures_stdout_and_stderr() {
        let spec = sh("echo out; echo err 1>&2; exit 3", Duration::from_secs(5));
        let outcome = run_command(&spec, &Interrupt::new()).unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.exit_code, 3);
        assert_eq!(outcome.stdout.trim(), "out");
        assert_eq!(outcome.stderr.trim(), "err");
    }

    #[test]
    fn test_timeout_kills_process() {
        let spec = sh("sleep 5", Duration::from_millis(200));
        let started = Instant::now();
        let err = run_command(&spec, &Interrupt::new()).unwrap_err();
        assert!(matches!(err, ExecError::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_interrupt_aborts_process() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let spec = sh("sleep 5", Duration::from_secs(10));
        let err = run_command(&spec, &interrupt).unwrap_err();
        assert!(matches!(err, ExecError::Interrupted));
    }

    #[test]
    fn test_timeout_kills_background_children() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let script = format!("(sleep 1; touch '{}') & wait", marker.display());
        let spec = sh(&script, Duration::from_millis(300));

        let err = run_command(&spec, &Interrupt::new()).unwrap_err();
        assert!(matches!(err, ExecError::TimedOut(_)));

        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[test]
    fn test_interrupt_kills_background_children() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let script = format!("(sleep 1; touch '{}') & wait", marker.display());
        let spec = sh(&script, Duration::from_secs(10));

        let interrupt = Interrupt::new();
        let trigger = interrupt.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            trigger.trigger();
        });
        let err = run_command(&spec, &interrupt).unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, ExecError::Interrupted));

        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let spec = CommandSpec::new("/nonexistent/program", Duration::from_secs(1));
        let err = run_command(&spec, &Interrupt::new()).unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
