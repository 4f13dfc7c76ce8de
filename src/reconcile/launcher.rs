use anyhow::{Context, Result};
use std::cell::RefCell;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use crate::fs::StateDir;
use crate::models::JobId;

/// Starts supervisor sessions in independent processes.
pub trait SessionLauncher {
    /// Launch a session for `(job_id, job_pid)` without waiting for it.
    ///
    /// Returns the pid of the launched process.
    fn launch(&self, job_id: JobId, job_pid: u32) -> Result<u32>;

    /// Collect sessions that have exited since the last call.
    fn reap_exited(&self) -> usize {
        0
    }
}

/// Spawns `<program> --state-dir <dir> supervise ...` detached from the
/// caller's terminal, each in its own process group.
pub struct ProcessLauncher {
    program: PathBuf,
    state: StateDir,
    children: RefCell<Vec<Child>>,
}

impl ProcessLauncher {
    pub fn new(program: PathBuf, state: StateDir) -> Self {
        Self {
            program,
            state,
            children: RefCell::new(Vec::new()),
        }
    }

    /// Launcher re-executing the running binary.
    pub fn current_exe(state: StateDir) -> Result<Self> {
        let program = std::env::current_exe().context("Failed to get current executable path")?;
        Ok(Self::new(program, state))
    }

    /// Sessions launched and not yet reaped.
    pub fn running(&self) -> usize {
        self.children.borrow().len()
    }

    fn command(&self, job_id: JobId, job_pid: u32) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--state-dir")
            .arg(self.state.root())
            .arg("supervise")
            .arg("--pid")
            .arg(job_pid.to_string())
            .arg("--job-id")
            .arg(job_id.to_string())
            .arg("--log-file")
            .arg(self.state.supervisor_log_path(job_id));

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);
        cmd
    }
}

impl SessionLauncher for ProcessLauncher {
    fn launch(&self, job_id: JobId, job_pid: u32) -> Result<u32> {
        let child = self.command(job_id, job_pid).spawn().with_context(|| {
            format!(
                "Failed to launch supervisor for job {job_id} via {}",
                self.program.display()
            )
        })?;

        let pid = child.id();
        self.children.borrow_mut().push(child);
        Ok(pid)
    }

    fn reap_exited(&self) -> usize {
        let mut children = self.children.borrow_mut();
        let before = children.len();

        children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(pid = child.id(), %status, "Supervisor process exited");
                false
            }
            Ok(None) => true,
            Err(e) => {
                tracing::warn!(pid = child.id(), error = %e, "Failed to poll supervisor process");
                false
            }
        });

        before - children.len()
    }
}
