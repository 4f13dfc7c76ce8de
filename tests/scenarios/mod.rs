//! End-to-end scenarios over the file-backed stores and the real binaries.

mod cache_gc;
mod cli;
mod reconcile;
mod supervise;

use jobwarden::fs::{FileJobStore, StateDir};
use jobwarden::models::{Job, JobId, JobStatus};
use std::process::{Child, Command};
use tempfile::TempDir;

/// Fresh, initialized state directory.
pub fn state_dir() -> (TempDir, StateDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let state = StateDir::new(tmp.path());
    state.initialize().expect("Failed to initialize state dir");
    (tmp, state)
}

/// Record a job in the given status for `pid`.
pub fn create_job(state: &StateDir, job_id: JobId, pid: u32, status: JobStatus) -> FileJobStore {
    let jobs = FileJobStore::new(state.clone());
    jobs.create(&Job::new(job_id, pid)).expect("Failed to create job");
    if status != JobStatus::Pending {
        jobs.set_status(job_id, JobStatus::Running)
            .expect("Failed to start job");
    }
    if status.is_terminal() {
        jobs.set_status(job_id, status).expect("Failed to finish job");
    }
    jobs
}

pub fn spawn_sleep(secs: &str) -> Child {
    Command::new("sleep")
        .arg(secs)
        .spawn()
        .expect("Failed to spawn sleep")
}
