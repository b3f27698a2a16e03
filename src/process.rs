use std::io;
use std::process::{Command, ExitStatus, Stdio};

#[cfg(test)]
use mockall::automock;

use crate::error::TunnelError;
use crate::ssh_args::Invocation;

/// The OS facilities the tunnel controller relies on.
#[cfg_attr(test, automock)]
pub trait ProcessControl {
    /// One line per running process: pid first, then its command line.
    fn listing(&self) -> Result<String, TunnelError>;
    /// Run `invocation` in the foreground with the caller's terminal and wait for it.
    /// ssh with `-f` returns once the tunnel is up and it has forked into the background.
    fn spawn(&self, invocation: &Invocation) -> Result<(), TunnelError>;
    /// Ask process `pid` to terminate.
    fn terminate(&self, pid: u32) -> Result<(), TunnelError>;
}

/// Real processes: `ps`, `ssh` from `PATH`, and `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessControl for SystemProcesses {
    fn listing(&self) -> Result<String, TunnelError> {
        let output = Command::new("ps")
            .args(["ax", "-o", "pid=", "-o", "args="])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| TunnelError::Listing(format!("failed to run ps: {e}")))?;
        if !output.status.success() {
            return Err(TunnelError::Listing(format!(
                "ps exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn spawn(&self, invocation: &Invocation) -> Result<(), TunnelError> {
        tracing::debug!(command = %invocation.command_line(), "starting ssh");
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(TunnelError::Spawn)?;
        check_exit(status)
    }

    fn terminate(&self, pid: u32) -> Result<(), TunnelError> {
        signal_terminate(pid).map_err(|source| TunnelError::Signal { pid, source })
    }
}

// Ctrl-C at an ssh prompt reaches ssh too; that exit is an interruption, not a failure.
fn check_exit(status: ExitStatus) -> Result<(), TunnelError> {
    if status.success() {
        return Ok(());
    }
    if interrupted(status) {
        return Err(TunnelError::Interrupted);
    }
    Err(TunnelError::SshExited(status.to_string()))
}

#[cfg(unix)]
fn interrupted(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    // 130 is the shell convention for "terminated by SIGINT"
    status.signal() == Some(libc::SIGINT) || status.code() == Some(128 + libc::SIGINT)
}

#[cfg(not(unix))]
fn interrupted(_status: ExitStatus) -> bool {
    false
}

#[cfg(unix)]
fn signal_terminate(pid: u32) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn signal_terminate(_pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "signalling processes is only supported on unix",
    ))
}

/// Pid of the first listed process whose command line contains `pattern`.
pub fn find_in_listing(listing: &str, pattern: &str) -> Option<u32> {
    let line = listing.lines().find(|line| line.contains(pattern))?;
    first_number(line)
}

// First run of ASCII digits in `line`.
fn first_number(line: &str) -> Option<u32> {
    line.split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())
        .and_then(|run| run.parse().ok())
}
