//! `jobwarden supervise`: run one job's watchdog in the foreground.

use anyhow::{Context, Result};

use crate::config::{seconds_to_duration, Config};
use crate::fs::{FileCache, FileJobStore, FileSignals, JobLog, StateDir};
use crate::models::JobId;
use crate::process::{ignore_interrupt, SystemProcesses};
use crate::store::JobRecordStore;
use crate::supervisor::{Collaborators, SessionConfig, SupervisorSession, Termination};

/// Supervise `job_id` whose worker runs as `pid` until the job is finalized.
///
/// `timeout` overrides the configured receive timeout in seconds.
pub fn execute(
    state: &StateDir,
    config: &Config,
    job_id: JobId,
    pid: u32,
    timeout: Option<f64>,
) -> Result<Termination> {
    ignore_interrupt()?;
    state.initialize()?;

    let mut session_config = SessionConfig::from_config(&config.supervisor)?;
    if let Some(secs) = timeout {
        session_config.receive_timeout = seconds_to_duration(secs)?;
    }

    let jobs = FileJobStore::new(state.clone());
    let supervisor_pid = std::process::id();
    jobs.set_supervisor_pid(job_id, supervisor_pid)
        .with_context(|| format!("Failed to claim supervision of job {job_id}"))?;

    let processes = SystemProcesses;
    let signals = FileSignals::new(state.clone(), config.progress.default_timeout_secs);
    let cache = FileCache::new(state.clone());
    let log = JobLog::new(state.clone());
    let mut tailer = log.tailer(job_id);

    let stores = Collaborators {
        processes: &processes,
        jobs: &jobs,
        signals: &signals,
        cache: &cache,
        publisher: Some(&log),
    };

    tracing::debug!(
        job_id,
        pid,
        supervisor_pid,
        check_interval_secs = session_config.check_interval().as_secs_f64(),
        "Starting supervisor session"
    );

    let termination = SupervisorSession::new(job_id, pid, session_config, stores, &mut tailer)
        .run()
        .with_context(|| format!("Supervisor for job {job_id} failed"))?;

    tracing::info!(job_id, outcome = %termination, "Supervision complete");
    Ok(termination)
}
