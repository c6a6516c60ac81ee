//! Child-process plumbing.
//!
//! - `run_with_timeout`: run a command to completion under a ceiling, capturing
//!   stdout then stderr as text.
//! - `reclaim_port`: best-effort SIGKILL of whatever holds a TCP port.
//! - `find_on_path`: locate an executable the way the shell would.
//! - `DevServer`: a long-running child in its own process group, released in
//!   two phases (SIGTERM to the group, then SIGKILL after a grace period) by
//!   `shutdown` or, failing that, by `Drop`.
//!
//! Signals are delivered through the system `kill` utility so a whole process
//! group can be targeted with `kill -<SIG> -- -<pgid>`.

use crate::error::RunError;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Interval between `try_wait` polls while waiting on a child.
const WAIT_POLL: Duration = Duration::from_millis(100);

/// Grace period between SIGTERM and SIGKILL during teardown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Term,
    Kill,
}

impl Signal {
    fn flag(self) -> &'static str {
        match self {
            Signal::Term => "-TERM",
            Signal::Kill => "-KILL",
        }
    }
}

/// Send `sig` to a single pid. Returns whether `kill` reported success.
pub fn signal_pid(pid: u32, sig: Signal) -> bool {
    send_signal(sig, &pid.to_string())
}

/// Send `sig` to every member of process group `pgid`.
pub fn signal_group(pgid: u32, sig: Signal) -> bool {
    send_signal(sig, &format!("-{pgid}"))
}

fn send_signal(sig: Signal, dest: &str) -> bool {
    let status = Command::new("kill")
        .args([sig.flag(), "--", dest])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(s) => {
            debug!(signal = sig.flag(), dest, delivered = s.success(), "kill");
            s.success()
        }
        Err(e) => {
            debug!(signal = sig.flag(), dest, error = %e, "kill unavailable");
            false
        }
    }
}

#[derive(Debug)]
/// A command that ran to completion.
pub struct Completed {
    pub code: Option<i32>,
    /// Captured stdout followed by captured stderr.
    pub output: String,
}

impl Completed {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run `program args..` in `cwd`, killing its process group if it outlives
/// `timeout`.
pub fn run_with_timeout(
    program: &str,
    args: &[String],
    cwd: &Path,
    timeout: Duration,
) -> Result<Completed, RunError> {
    let stdout_capture = tempfile::tempfile()?;
    let stderr_capture = tempfile::tempfile()?;
    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_capture.try_clone()?))
        .stderr(Stdio::from(stderr_capture.try_clone()?))
        .process_group(0)
        .spawn()
        .map_err(|source| RunError::Spawn {
            program: program.to_string(),
            source,
        })?;
    debug!(program, pid = child.id(), "spawned");

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if started.elapsed() >= timeout {
                    warn!(program, secs = timeout.as_secs(), "command timed out");
                    signal_group(child.id(), Signal::Kill);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunError::TimedOut(timeout.as_secs()));
                }
                thread::sleep(WAIT_POLL);
            }
            Err(source) => {
                let _ = child.kill();
                return Err(RunError::Wait {
                    program: program.to_string(),
                    source,
                });
            }
        }
    };

    let mut output = read_capture(stdout_capture)?;
    output.push_str(&read_capture(stderr_capture)?);
    Ok(Completed {
        code: status.code(),
        output,
    })
}

fn read_capture(mut file: File) -> Result<String, std::io::Error> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// SIGKILL every process `lsof` reports on `port`, except ourselves.
///
/// Never fails: a missing `lsof`, unparsable output, or vanished pids are
/// ignored. Returns how many processes were signalled.
pub fn reclaim_port(port: u16) -> usize {
    let out = match Command::new("lsof")
        .arg("-ti")
        .arg(format!(":{port}"))
        .stdin(Stdio::null())
        .output()
    {
        Ok(o) => o,
        Err(e) => {
            debug!(port, error = %e, "lsof unavailable; skipping port reclamation");
            return 0;
        }
    };
    let own = std::process::id();
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .filter_map(|line| line.trim().parse::<u32>().ok())
        .filter(|pid| *pid != own)
        .filter(|pid| signal_pid(*pid, Signal::Kill))
        .count()
}

/// First executable file named `program` on `PATH`. A name containing a
/// slash is checked as given.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let is_executable = |p: &Path| {
        p.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    };
    if program.contains('/') {
        let p = PathBuf::from(program);
        return is_executable(&p).then_some(p);
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| is_executable(p))
}

/// Poll `child` until it exits or `limit` elapses. True if it exited.
fn wait_for_exit(child: &mut Child, limit: Duration) -> bool {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) if started.elapsed() < limit => thread::sleep(WAIT_POLL),
            Ok(None) => return false,
            // Not waitable any more; treat as gone.
            Err(_) => return true,
        }
    }
}

/// Exclusive handle on a dev server child and its process group.
pub struct DevServer {
    child: Option<Child>,
    pid: u32,
    capture: File,
    grace: Duration,
}

impl DevServer {
    /// Start `program args..` in `cwd` as the leader of a new process group,
    /// with stdout and stderr captured to an anonymous temp file.
    pub fn spawn(program: &str, args: &[String], cwd: &Path) -> Result<Self, RunError> {
        let capture = tempfile::tempfile()?;
        let child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::from(capture.try_clone()?))
            .stderr(Stdio::from(capture.try_clone()?))
            .process_group(0)
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: program.to_string(),
                source,
            })?;
        let pid = child.id();
        debug!(program, pid, "dev server spawned");
        Ok(DevServer {
            child: Some(child),
            pid,
            capture,
            grace: SHUTDOWN_GRACE,
        })
    }

    /// Override the SIGTERM to SIGKILL grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Pid of the group leader (also the process group id).
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether the leader process has already exited.
    pub fn has_exited(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => !matches!(child.try_wait(), Ok(None)),
            None => true,
        }
    }

    /// Last `lines` lines of the captured server output.
    pub fn output_tail(&self, lines: usize) -> String {
        let text = match self.capture.try_clone().and_then(read_capture) {
            Ok(t) => t,
            Err(_) => return String::new(),
        };
        let all: Vec<&str> = text.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }

    /// Stop the server and its group now.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        signal_group(self.pid, Signal::Term);
        if wait_for_exit(&mut child, self.grace) {
            debug!(pid = self.pid, "dev server exited after SIGTERM");
        } else {
            warn!(pid = self.pid, "dev server ignored SIGTERM; sending SIGKILL");
            signal_group(self.pid, Signal::Kill);
        }
        // Stragglers in the group that outlived the leader.
        signal_group(self.pid, Signal::Kill);
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl Drop for DevServer {
    fn drop(&mut self) {
        self.teardown();
    }
}
