//! `jobwarden job ...`: create and inspect job records.

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::fs::{FileJobStore, FileSignals, StateDir};
use crate::models::{Job, JobId, JobStatus};
use crate::store::JobRecordStore;

use super::colored_status;

/// Register a freshly launched worker as a pending job.
///
/// Statistics left behind by an earlier job with the same id are dropped.
pub fn create(
    state: &StateDir,
    config: &Config,
    job_id: JobId,
    pid: u32,
    supervisor_pid: Option<u32>,
    progress_timeout: Option<u64>,
) -> Result<()> {
    state.initialize()?;

    let mut job = Job::new(job_id, pid);
    job.supervisor_pid = supervisor_pid;
    job.progress_timeout_secs = progress_timeout;
    FileJobStore::new(state.clone()).create(&job)?;
    FileSignals::new(state.clone(), config.progress.default_timeout_secs).clear(job_id)?;

    println!(
        "{} Created job {} (pid {})",
        "✓".green(),
        job_id.to_string().cyan(),
        pid
    );
    Ok(())
}

pub fn show(state: &StateDir, job_id: JobId) -> Result<()> {
    let job = FileJobStore::new(state.clone()).get(job_id)?;

    println!("{} {}", "Job".bold(), job.id.to_string().cyan());
    println!("  status:         {}", colored_status(job.status));
    println!("  pid:            {}", job.pid);
    println!(
        "  supervisor pid: {}",
        job.supervisor_pid
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".dimmed().to_string())
    );
    println!("  started:        {}", job.start_time.format("%Y-%m-%dT%H:%M:%SZ"));
    if let Some(stop) = job.stop_time {
        println!("  stopped:        {}", stop.format("%Y-%m-%dT%H:%M:%SZ"));
    }
    if let Some(timeout) = job.progress_timeout_secs {
        println!("  stall timeout:  {timeout}s");
    }

    if !job.errors.is_empty() {
        println!("  {}", "errors:".red());
        for error in &job.errors {
            println!(
                "    {} {}",
                error
                    .recorded_at
                    .format("%Y-%m-%dT%H:%M:%SZ")
                    .to_string()
                    .dimmed(),
                error.detail
            );
        }
    }
    Ok(())
}

pub fn list(state: &StateDir) -> Result<()> {
    let jobs = FileJobStore::new(state.clone()).load_all()?;
    if jobs.is_empty() {
        println!("{} No jobs recorded", "─".dimmed());
        return Ok(());
    }

    println!(
        "{:>8}  {:<10}  {:>8}  {:>10}  {}",
        "ID".bold(),
        "STATUS".bold(),
        "PID".bold(),
        "SUPERVISOR".bold(),
        "STARTED".bold()
    );
    for job in jobs {
        println!(
            "{:>8}  {:<10}  {:>8}  {:>10}  {}",
            job.id,
            colored_status(job.status),
            job.pid,
            job.supervisor_pid
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            job.start_time.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

/// Validated status change; rejects edges outside pending → running → terminal.
pub fn set_status(state: &StateDir, job_id: JobId, status: JobStatus) -> Result<()> {
    let job = FileJobStore::new(state.clone()).set_status(job_id, status)?;
    println!(
        "{} Job {} is now {}",
        "✓".green(),
        job.id.to_string().cyan(),
        colored_status(job.status)
    );
    Ok(())
}
