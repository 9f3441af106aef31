//! Process runner: one VM invocation per fixture.

use std::ffi::OsString;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};

use crate::error::HarnessError;

/// Flag selecting verbose diagnostics on the VM.
pub const DEFAULT_VERBOSE_FLAG: &str = "-v";

/// Argument telling the VM to read the program from stdin.
pub const STDIN_PROGRAM: &str = "-";

/// Captured result of one VM run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code, or the negated signal number if the VM was killed.
    pub exit_status: i32,
    pub stdout: String,
    /// Trailing whitespace already trimmed.
    pub stderr: String,
}

/// Launches the VM executable under test.
#[derive(Debug, Clone)]
pub struct VmRunner {
    vm: PathBuf,
    verbose_flag: String,
}

impl VmRunner {
    pub fn new(vm: impl Into<PathBuf>) -> Self {
        Self {
            vm: vm.into(),
            verbose_flag: DEFAULT_VERBOSE_FLAG.to_string(),
        }
    }

    pub fn with_verbose_flag(mut self, flag: impl Into<String>) -> Self {
        self.verbose_flag = flag.into();
        self
    }

    pub fn vm(&self) -> &Path {
        &self.vm
    }

    /// Whether the VM executable exists on disk.
    pub fn is_available(&self) -> bool {
        self.vm.exists()
    }

    /// `[-m <mem>] <verbose-flag> -`
    pub fn args(&self, mem: Option<&Path>) -> Vec<OsString> {
        let mut args = Vec::with_capacity(4);
        if let Some(mem) = mem {
            args.push(OsString::from("-m"));
            args.push(mem.as_os_str().to_owned());
        }
        args.push(OsString::from(&self.verbose_flag));
        args.push(OsString::from(STDIN_PROGRAM));
        args
    }

    /// Run the VM with `program` on stdin, blocking until it exits.
    ///
    /// There is no timeout: a VM that never exits blocks the caller.
    pub fn run(&self, program: &[u8], mem: Option<&Path>) -> Result<ProcessResult, HarnessError> {
        let args = self.args(mem);
        log::debug!("running {} {:?} ({} program bytes)", self.vm.display(), args, program.len());

        let child = Command::new(&self.vm)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                path: self.vm.clone(),
                source,
            })?;

        let output = communicate(child, program)?;
        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| HarnessError::Decode { stream: "stdout" })?;
        let stderr = String::from_utf8(output.stderr)
            .map_err(|_| HarnessError::Decode { stream: "stderr" })?;

        let result = ProcessResult {
            exit_status: exit_code(output.status),
            stdout,
            stderr: stderr.trim_end().to_string(),
        };
        log::trace!(
            "exit={} stdout={:?} stderr={:?}",
            result.exit_status,
            result.stdout,
            result.stderr
        );
        Ok(result)
    }
}

/// Feed `input` to the child's stdin while draining stdout and stderr.
///
/// Stdin is written from a scoped thread and closed when done, so a child
/// that produces output while still reading cannot fill a pipe and stall.
pub(crate) fn communicate(mut child: Child, input: &[u8]) -> io::Result<Output> {
    let stdin = child.stdin.take();
    std::thread::scope(|scope| {
        let writer = scope.spawn(move || -> io::Result<()> {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(input) {
                    // The child may legitimately exit before draining its input.
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                    other => other?,
                }
            }
            Ok(())
        });

        let output = child.wait_with_output();
        let written = writer
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
        let output = output?;
        written?;
        Ok(output)
    })
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}
