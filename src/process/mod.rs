//! Process table access and signal delivery.
//!
//! [`ProcessController`] is the seam the supervisor and reconciler use;
//! [`SystemProcesses`] is the real implementation over `nix`.

use anyhow::{bail, Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{kill, signal, SigHandler, Signal};
use nix::unistd::Pid;

/// Liveness queries and termination for OS processes.
pub trait ProcessController {
    /// Whether a process with this pid currently exists.
    fn is_alive(&self, pid: u32) -> bool;

    /// Send an uncatchable termination signal. Must be a no-op for dead pids.
    fn terminate(&self, pid: u32) -> Result<()>;
}

/// [`ProcessController`] backed by the host's process table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessController for SystemProcesses {
    fn is_alive(&self, pid: u32) -> bool {
        is_process_alive(pid)
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        terminate_process(pid)
    }
}

/// Check if a process with the given PID is alive
///
/// Uses `nix::sys::signal::kill` with signal `None` (signal 0). A process we
/// lack permission to signal (`EPERM`) still exists; `ESRCH` means it is gone.
/// PID 0 names the caller's process group rather than a process, and PIDs
/// above `i32::MAX` cannot exist; both report `false`.
pub fn is_process_alive(pid: u32) -> bool {
    let Some(pid_i32) = single_process_pid(pid) else {
        return false;
    };

    match kill(Pid::from_raw(pid_i32), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(Errno::ESRCH) => false,
        Err(_) => false,
    }
}

/// Kill a process with SIGKILL.
///
/// A process that has already exited is not an error. PID 0 is refused
/// because `kill(0, ..)` signals the whole calling process group.
pub fn terminate_process(pid: u32) -> Result<()> {
    if pid == 0 {
        bail!("Refusing to send SIGKILL to pid 0 (the caller's process group)");
    }
    let Some(pid_i32) = single_process_pid(pid) else {
        return Ok(());
    };

    tracing::info!(pid, "Terminating job process");

    match kill(Pid::from_raw(pid_i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to send SIGKILL to process {pid}")),
    }
}

/// A pid that addresses exactly one process: nonzero and within `i32`.
fn single_process_pid(pid: u32) -> Option<i32> {
    i32::try_from(pid).ok().filter(|&p| p > 0)
}

/// Ignore SIGINT for the rest of this process's life.
///
/// Supervisors share a process group with the workers they watch; a Ctrl-C
/// aimed at the worker group must not take the supervisor down with it.
pub fn ignore_interrupt() -> Result<()> {
    // SAFETY: SigIgn installs no Rust handler, so no async-signal-safety concerns.
    unsafe { signal(Signal::SIGINT, SigHandler::SigIgn) }
        .context("Failed to ignore SIGINT")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_current_process_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }

    #[test]
    fn test_nonexistent_process_is_not_alive() {
        assert!(!is_process_alive(999999999));
    }

    #[test]
    fn test_u32_max_overflow_returns_false() {
        assert!(!is_process_alive(u32::MAX));
    }

    #[test]
    fn test_pid_zero_is_not_alive() {
        assert!(!is_process_alive(0));
        assert!(!SystemProcesses.is_alive(0));
    }

    #[test]
    fn test_terminate_refuses_pid_zero() {
        let err = terminate_process(0).unwrap_err();
        assert!(err.to_string().contains("pid 0"));
    }

    #[test]
    fn test_terminate_kills_child() {
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("Failed to spawn sleep");
        let pid = child.id();

        SystemProcesses.terminate(pid).unwrap();

        let status = child.wait().expect("Failed to wait for child");
        assert!(!status.success());
        assert!(!SystemProcesses.is_alive(pid));
    }

    #[test]
    fn test_terminate_dead_pid_is_noop() {
        assert!(terminate_process(999999999).is_ok());
        assert!(terminate_process(u32::MAX).is_ok());
    }
}
