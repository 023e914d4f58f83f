//! External command capability.
//!
//! Every tool the batch shells out to goes through [`CommandRunner`], so the
//! pipeline can be driven by a scripted runner in tests instead of real
//! subprocesses.

use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::{Error, Result};

/// Poll interval while waiting on a child with a deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Arguments as lossy UTF-8, for matching and logging.
    #[must_use]
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Shell-like rendering of the command line.
    #[must_use]
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Successful exit with the given stdout.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Failed exit with the given code and stderr.
    pub fn failed(status: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(status),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }

    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs external commands, capturing stdout and stderr.
///
/// An `Err` means the command could not be run at all (missing tool, spawn
/// failure, timeout); a non-zero exit is reported through
/// [`CommandOutput::status`].
pub trait CommandRunner: Sync {
    /// Run the command to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be spawned or did not finish.
    fn run(&self, cmd: &ToolCommand) -> io::Result<CommandOutput>;
}

/// Runs commands as real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    #[must_use]
    pub const fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ToolCommand) -> io::Result<CommandOutput> {
        debug!(command = %cmd.display(), "running");

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let Some(timeout) = self.timeout else {
            let output = command.output()?;
            return Ok(CommandOutput {
                status: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        };

        let mut child = command.spawn()?;
        // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    terminate(&mut child);
                    return Err(e);
                }
            }
            if Instant::now() >= deadline {
                warn!(command = %cmd.display(), ?timeout, "command timed out, killing");
                terminate(&mut child);
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("timed out after {:.1}s", timeout.as_secs_f64()),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(CommandOutput {
            status: status.code(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

/// Kill and reap a child we are giving up on. Its pipes close with it, so the
/// drain threads finish on their own.
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Run a command and require a zero exit status.
///
/// # Errors
///
/// [`Error::Invocation`] if the command could not be run, [`Error::ToolFailed`]
/// (carrying the captured stderr) if it exited unsuccessfully.
pub fn run_checked(runner: &dyn CommandRunner, cmd: &ToolCommand) -> Result<CommandOutput> {
    let output = runner.run(cmd).map_err(|source| Error::Invocation {
        command: cmd.display(),
        source,
    })?;

    if !output.success() {
        return Err(Error::ToolFailed {
            command: cmd.display(),
            status: output.status,
            stderr: output.stderr_lossy(),
        });
    }

    Ok(output)
}

/// Toolchain prefixes probed when no object-copy tool is configured.
pub const TOOLCHAIN_PREFIXES: &[&str] = &[
    "riscv32-unknown-elf-",
    "riscv64-unknown-elf-",
    "riscv64-linux-gnu-",
    "riscv32-linux-gnu-",
];

/// Find a RISC-V `objcopy` on `PATH`.
///
/// Returns the first `<prefix>objcopy` that `which` can resolve.
pub fn find_objcopy(runner: &dyn CommandRunner) -> Option<String> {
    TOOLCHAIN_PREFIXES.iter().find_map(|prefix| {
        let tool = format!("{prefix}objcopy");
        runner
            .run(&ToolCommand::new("which").arg(&tool))
            .is_ok_and(|o| o.success())
            .then_some(tool)
    })
}
