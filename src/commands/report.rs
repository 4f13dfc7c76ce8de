//! `jobwarden report ...`: worker-side signals.
//!
//! Workers and node monitors call these to publish log messages, count
//! failures, mark progress and report failed compute nodes.

use anyhow::{bail, Result};
use colored::Colorize;

use crate::config::Config;
use crate::events::RoutingKey;
use crate::fs::{FileCache, FileSignals, JobLog, StateDir};
use crate::models::constants::FAILURE_COUNTER_TAG;
use crate::models::{JobId, LogMessage, Severity};
use crate::store::LogPublisher;

/// Append a message to the job's log stream.
///
/// The logger must live in the job's namespace or no supervisor would see it.
pub fn log(
    state: &StateDir,
    job_id: JobId,
    logger: &str,
    severity: Severity,
    message: &str,
) -> Result<()> {
    let key = RoutingKey::for_job(job_id);
    if !key.matches(logger) {
        bail!(
            "Logger '{logger}' is outside job {job_id}'s namespace (expected '{0}' or '{0}.<name>')",
            key.namespace()
        );
    }

    state.initialize()?;
    JobLog::new(state.clone()).publish(job_id, &LogMessage::new(logger, severity, message))
}

/// Count one failure event; `name` gets the `:failed` tag if it lacks it.
pub fn failure(
    state: &StateDir,
    config: &Config,
    job_id: JobId,
    area: &str,
    name: &str,
) -> Result<()> {
    let name = failure_counter_name(name);
    state.initialize()?;
    let count = signals(state, config).incr_counter(job_id, area, &name)?;
    println!(
        "{} {}/{} = {}",
        "✗".red(),
        area,
        name,
        count.to_string().bold()
    );
    Ok(())
}

pub fn progress(state: &StateDir, config: &Config, job_id: JobId) -> Result<()> {
    state.initialize()?;
    signals(state, config).record_progress(job_id)
}

pub fn failed_nodes(state: &StateDir, config: &Config, job_id: JobId, count: u32) -> Result<()> {
    state.initialize()?;
    signals(state, config).set_failed_nodes(job_id, count)
}

/// Store a job-scoped cache entry.
pub fn cache(state: &StateDir, job_id: JobId, key: &str, value: &str) -> Result<()> {
    state.initialize()?;
    FileCache::new(state.clone()).put(job_id, key, value)
}

fn signals(state: &StateDir, config: &Config) -> FileSignals {
    FileSignals::new(state.clone(), config.progress.default_timeout_secs)
}

fn failure_counter_name(name: &str) -> String {
    if name.ends_with(FAILURE_COUNTER_TAG) {
        name.to_string()
    } else {
        format!("{name}{FAILURE_COUNTER_TAG}")
    }
}
