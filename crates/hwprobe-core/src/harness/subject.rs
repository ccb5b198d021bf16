//! Building and invoking the subject executable.
//!
//! The subject runs as a separate OS process for every trial. Process start
//! overhead is part of the measured latency.

use super::corpus::Sample;
use super::sink::ProgressSink;
use crate::config::HarnessConfig;
use crate::error::Error;
use hwprobe_util::fs::is_executable;
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
#[cfg(unix)]
use std::sync::mpsc::{self, RecvTimeoutError};
#[cfg(unix)]
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Flag passed to the subject ahead of the sample text.
pub const SUBJECT_FLAG: &str = "-g";

/// How much of a failing child's stderr to keep in error messages.
const STDERR_EXCERPT_CHARS: usize = 200;

/// Whether `ensure_built` had to run the build command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    AlreadyPresent,
    Built,
}

/// Result of a successful [`ensure_built`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltSubject {
    pub path: PathBuf,
    pub outcome: BuildOutcome,
}

/// Program and arguments that build the subject, run inside its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BuildCommand {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One completed subject invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Captured stdout, uninterpreted.
    pub output: Vec<u8>,
    /// Wall-clock time from spawn to exit.
    pub elapsed: Duration,
}

/// Make sure `build_dir/executable_name` exists, building it if it does not.
///
/// Anything already at that path is left alone, so repeated calls after one
/// successful build do nothing. A present file that cannot be executed is
/// reported when the subject is invoked.
pub fn ensure_built(
    build_dir: &Path,
    executable_name: &str,
    build: &BuildCommand,
) -> Result<BuiltSubject, Error> {
    let path = build_dir.join(executable_name);
    if path.exists() {
        return Ok(BuiltSubject {
            path,
            outcome: BuildOutcome::AlreadyPresent,
        });
    }

    let failure = |reason: String| Error::BuildFailure {
        dir: build_dir.to_path_buf(),
        executable: executable_name.to_string(),
        reason,
    };

    let output = Command::new(&build.program)
        .args(&build.args)
        .current_dir(build_dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| failure(format!("could not launch `{}`: {e}", build.describe())))?;

    if !output.status.success() {
        return Err(failure(format!(
            "`{}` exited with {}: {}",
            build.describe(),
            output.status,
            stderr_excerpt(&output.stderr)
        )));
    }

    if !path.exists() {
        return Err(failure(format!(
            "`{}` succeeded but {} is still missing",
            build.describe(),
            path.display()
        )));
    }
    if !is_executable(&path) {
        return Err(failure(format!(
            "`{}` produced {} but it is not executable",
            build.describe(),
            path.display()
        )));
    }

    Ok(BuiltSubject {
        path,
        outcome: BuildOutcome::Built,
    })
}

/// Run `<executable> -g <sample>` to completion and time it.
///
/// The timer starts immediately before spawn and stops when the child has
/// exited and its pipes are drained. With a `timeout`, the subject runs in its
/// own process group and the whole group is killed once the limit passes.
pub fn invoke(
    executable: &Path,
    sample: &Sample,
    timeout: Option<Duration>,
) -> Result<Invocation, Error> {
    if timeout.is_some() && !cfg!(unix) {
        return Err(Error::invalid_argument(
            "subject timeouts are only supported on Unix",
        ));
    }

    let failure = |reason: String| Error::SubjectInvocation {
        path: executable.to_path_buf(),
        trial: None,
        reason,
    };

    let mut command = Command::new(executable);
    command
        .arg(SUBJECT_FLAG)
        .arg(sample.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let run = match timeout {
        Some(limit) => run_with_deadline(&mut command, limit),
        None => run_to_exit(&mut command),
    }
    .map_err(failure)?;

    if run.killed {
        let limit_ms = timeout.map_or(0, |t| t.as_millis());
        return Err(failure(format!("no exit after {limit_ms} ms; killed")));
    }
    if !run.output.status.success() {
        return Err(failure(format!(
            "exited with {}: {}",
            run.output.status,
            stderr_excerpt(&run.output.stderr)
        )));
    }

    Ok(Invocation {
        output: run.output.stdout,
        elapsed: run.elapsed,
    })
}

fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "(no stderr)".to_string();
    }
    trimmed.chars().take(STDERR_EXCERPT_CHARS).collect()
}

/// A finished child, its timing, and whether the watchdog fired.
struct TimedRun {
    output: Output,
    elapsed: Duration,
    killed: bool,
}

fn run_to_exit(command: &mut Command) -> Result<TimedRun, String> {
    let start = Instant::now();
    let child = command
        .spawn()
        .map_err(|e| format!("could not launch: {e}"))?;
    let output = child
        .wait_with_output()
        .map_err(|e| format!("could not collect exit status: {e}"))?;

    Ok(TimedRun {
        output,
        elapsed: start.elapsed(),
        killed: false,
    })
}

/// Run under a watchdog that may kill the subject's process group.
///
/// The child is reaped only after the watchdog has been disarmed. Until then
/// its pid, which is also the group id, cannot be handed to another process,
/// so the kill never reaches anything outside the subject's group.
#[cfg(unix)]
fn run_with_deadline(command: &mut Command, limit: Duration) -> Result<TimedRun, String> {
    use std::os::unix::process::CommandExt;

    command.process_group(0);
    let watchdog = Watchdog::arm(limit).map_err(|e| format!("could not start watchdog: {e}"))?;

    let start = Instant::now();
    let mut child = command
        .spawn()
        .map_err(|e| format!("could not launch: {e}"))?;
    watchdog.watch(child.id());

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let exited = wait_unreaped(child.id());
    let stdout = collect(stdout);
    let stderr = collect(stderr);
    let elapsed = start.elapsed();

    let killed = watchdog.disarm();
    let status = child
        .wait()
        .map_err(|e| format!("could not collect exit status: {e}"))?;
    exited.map_err(|e| format!("could not wait for exit: {e}"))?;

    Ok(TimedRun {
        output: Output {
            status,
            stdout: stdout?,
            stderr: stderr?,
        },
        elapsed,
        killed,
    })
}

#[cfg(not(unix))]
fn run_with_deadline(_command: &mut Command, _limit: Duration) -> Result<TimedRun, String> {
    Err("subject timeouts are only supported on Unix".to_string())
}

/// Read a child pipe to the end on its own thread.
#[cfg(unix)]
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

#[cfg(unix)]
fn collect(handle: JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>, String> {
    handle
        .join()
        .map_err(|_| "output reader panicked".to_string())?
        .map_err(|e| format!("could not read output: {e}"))
}

/// Block until `pid` has exited, leaving it waitable.
#[cfg(unix)]
fn wait_unreaped(pid: u32) -> io::Result<()> {
    loop {
        // SAFETY: siginfo_t is plain data and all-zero is a valid value.
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        // SAFETY: `info` is a live, writable siginfo_t for the duration of the call.
        let rc = unsafe {
            libc::waitid(
                libc::P_PID,
                pid,
                &mut info,
                libc::WEXITED | libc::WNOWAIT,
            )
        };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(unix)]
enum WatchSignal {
    Watch(u32),
    Done,
}

/// Kills a subject's process group once it runs past its limit.
///
/// The thread is spawned before the timed window opens; only the pid hand-off
/// happens inside it.
#[cfg(unix)]
struct Watchdog {
    tx: mpsc::Sender<WatchSignal>,
    handle: Option<JoinHandle<bool>>,
}

#[cfg(unix)]
impl Watchdog {
    fn arm(limit: Duration) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("hwprobe-watchdog".into())
            .spawn(move || {
                let Ok(WatchSignal::Watch(pid)) = rx.recv() else {
                    return false;
                };
                match rx.recv_timeout(limit) {
                    Err(RecvTimeoutError::Timeout) => {
                        kill_group(pid);
                        true
                    }
                    Ok(_) | Err(RecvTimeoutError::Disconnected) => false,
                }
            })?;

        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    fn watch(&self, pid: u32) {
        let _ = self.tx.send(WatchSignal::Watch(pid));
    }

    /// Stop watching. Returns true if the group was killed.
    fn disarm(mut self) -> bool {
        let _ = self.tx.send(WatchSignal::Done);
        self.handle
            .take()
            .is_some_and(|h| h.join().unwrap_or(false))
    }
}

#[cfg(unix)]
impl Drop for Watchdog {
    fn drop(&mut self) {
        let _ = self.tx.send(WatchSignal::Done);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// SIGKILL every process in the group led by `pid`.
#[cfg(unix)]
#[allow(clippy::cast_possible_wrap)]
fn kill_group(pid: u32) {
    // SAFETY: kill(2) has no memory-safety preconditions.
    unsafe {
        libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
    }
}

/// Something the collector can build once and invoke per trial.
pub trait Subject {
    /// Make the subject invocable. Called once before the first trial.
    fn ensure_built(&mut self, progress: &mut dyn ProgressSink) -> Result<BuildOutcome, Error>;

    /// Run the subject on one sample.
    fn invoke(&mut self, sample: &Sample) -> Result<Invocation, Error>;
}

impl<S: Subject + ?Sized> Subject for &mut S {
    fn ensure_built(&mut self, progress: &mut dyn ProgressSink) -> Result<BuildOutcome, Error> {
        (**self).ensure_built(progress)
    }

    fn invoke(&mut self, sample: &Sample) -> Result<Invocation, Error> {
        (**self).invoke(sample)
    }
}

/// The real subject: an executable on disk, run as a child process.
#[derive(Debug, Clone)]
pub struct ProcessSubject {
    dir: PathBuf,
    executable_name: String,
    build: BuildCommand,
    timeout: Option<Duration>,
}

impl ProcessSubject {
    /// Build a subject from the run configuration.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, Error> {
        if config.timeout_ms.is_some() && !cfg!(unix) {
            return Err(Error::invalid_argument(
                "subject timeouts are only supported on Unix",
            ));
        }
        Ok(Self {
            dir: config.subject_dir.clone(),
            executable_name: config.executable_name.clone(),
            build: BuildCommand::new(config.build_program.clone(), config.build_args.clone()),
            timeout: config.timeout(),
        })
    }

    #[must_use]
    pub fn executable_path(&self) -> PathBuf {
        self.dir.join(&self.executable_name)
    }
}

impl Subject for ProcessSubject {
    fn ensure_built(&mut self, progress: &mut dyn ProgressSink) -> Result<BuildOutcome, Error> {
        if !self.executable_path().exists() {
            progress.build_started(&self.dir);
        }
        ensure_built(&self.dir, &self.executable_name, &self.build).map(|built| built.outcome)
    }

    fn invoke(&mut self, sample: &Sample) -> Result<Invocation, Error> {
        invoke(&self.executable_path(), sample, self.timeout)
    }
}
