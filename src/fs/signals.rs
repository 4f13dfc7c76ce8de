//! Per-job failure counters and progress tracking under `<state>/stats/`.
//!
//! Workers and node monitors update these files; supervisors only read them.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::models::constants::FAILURE_COUNTER_TAG;
use crate::models::{FailureCounters, JobId, ProgressTiming};
use crate::store::{FailureSignalSource, JobRecordStore};

use super::job_store::FileJobStore;
use super::locking::{locked_read, locked_update};
use super::state_dir::StateDir;

/// Persisted statistics for one job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStats {
    /// Event counts keyed by `<area>/<name>`
    #[serde(default)]
    pub counters: BTreeMap<String, u64>,
    #[serde(default)]
    pub last_progress: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_nodes: u32,
}

/// [`FailureSignalSource`] over the stats files, plus the worker-side writers.
#[derive(Debug, Clone)]
pub struct FileSignals {
    state: StateDir,
    jobs: FileJobStore,
    default_timeout_secs: u64,
}

impl FileSignals {
    pub fn new(state: StateDir, default_timeout_secs: u64) -> Self {
        Self {
            jobs: FileJobStore::new(state.clone()),
            state,
            default_timeout_secs,
        }
    }

    pub fn load(&self, job_id: JobId) -> Result<JobStats> {
        let path = self.state.stats_path(job_id);
        if !path.exists() {
            return Ok(JobStats::default());
        }
        parse_stats(&locked_read(&path)?, &path)
    }

    /// Increment the `<area>/<name>` counter of a job and return the new count.
    pub fn incr_counter(&self, job_id: JobId, area: &str, name: &str) -> Result<u64> {
        let key = format!("{area}/{name}");
        let mut count = 0;
        self.update(job_id, |stats| {
            let entry = stats.counters.entry(key).or_insert(0);
            *entry += 1;
            count = *entry;
        })?;
        Ok(count)
    }

    /// Mark that the job made progress just now.
    pub fn record_progress(&self, job_id: JobId) -> Result<()> {
        self.record_progress_at(job_id, Utc::now())
    }

    pub fn record_progress_at(&self, job_id: JobId, at: DateTime<Utc>) -> Result<()> {
        self.update(job_id, |stats| stats.last_progress = Some(at))
    }

    pub fn set_failed_nodes(&self, job_id: JobId, count: u32) -> Result<()> {
        self.update(job_id, |stats| stats.failed_nodes = count)
    }

    /// Drop every statistic recorded for a job.
    pub fn clear(&self, job_id: JobId) -> Result<()> {
        let path = self.state.stats_path(job_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove stats file: {}", path.display())),
        }
    }

    fn update<F>(&self, job_id: JobId, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut JobStats),
    {
        let path = self.state.stats_path(job_id);
        // Create without truncating so concurrent first writers don't clobber each other.
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to create stats file: {}", path.display()))?;

        locked_update(&path, |content| {
            let mut stats = parse_stats(content, &path)?;
            mutate(&mut stats);
            serde_yaml::to_string(&stats).context("Failed to serialize job stats")
        })
    }
}

fn parse_stats(content: &str, path: &Path) -> Result<JobStats> {
    if content.trim().is_empty() {
        return Ok(JobStats::default());
    }
    serde_yaml::from_str(content)
        .with_context(|| format!("Failed to parse stats file: {}", path.display()))
}

impl FailureSignalSource for FileSignals {
    fn failure_counters(&self, job_id: JobId) -> Result<FailureCounters> {
        let stats = self.load(job_id)?;
        Ok(stats
            .counters
            .into_iter()
            .filter(|(key, _)| key.ends_with(FAILURE_COUNTER_TAG))
            .collect())
    }

    fn progress_timing(&self, job_id: JobId) -> Result<ProgressTiming> {
        let job = self.jobs.get(job_id)?;
        let stats = self.load(job_id)?;

        let since = stats.last_progress.unwrap_or(job.start_time);
        let elapsed = (Utc::now() - since).num_seconds().max(0) as u64;

        Ok(ProgressTiming {
            no_progress_period: elapsed,
            timeout: job.progress_timeout_secs.unwrap_or(self.default_timeout_secs),
        })
    }

    fn failed_node_count(&self, job_id: JobId) -> Result<u32> {
        Ok(self.load(job_id)?.failed_nodes)
    }
}
