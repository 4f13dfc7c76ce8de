//! YAML job records under `<state>/jobs/`.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::fs;

use crate::error::StoreError;
use crate::models::{ErrorRecord, Job, JobId, JobStatus};
use crate::store::JobRecordStore;

use super::locking::{locked_read, locked_update, locked_write};
use super::state_dir::{job_id_from_path, StateDir};

/// [`JobRecordStore`] keeping one YAML file per job.
#[derive(Debug, Clone)]
pub struct FileJobStore {
    state: StateDir,
}

impl FileJobStore {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }

    /// Write a new record. Fails if the job already exists.
    pub fn create(&self, job: &Job) -> Result<()> {
        let path = self.state.job_path(job.id);
        if path.exists() {
            bail!("Job {} already exists: {}", job.id, path.display());
        }
        let content = serde_yaml::to_string(job).context("Failed to serialize job record")?;
        locked_write(&path, &content)
    }

    /// Validated status change, as used by workers and operators.
    ///
    /// Unlike [`JobRecordStore::set_status_and_error`], this refuses edges outside
    /// pending → running → succeeded/failed.
    pub fn set_status(&self, job_id: JobId, status: JobStatus) -> Result<Job> {
        let mut updated = None;
        self.update(job_id, |job| {
            if !job.status.can_transition_to(&status) {
                return Err(StoreError::InvalidTransition {
                    job_id,
                    from: job.status,
                    to: status,
                }
                .into());
            }
            job.status = status;
            updated = Some(job.clone());
            Ok(())
        })?;
        updated.context("Job record update produced no result")
    }

    /// All job records, ascending by id. Unreadable records are skipped with a warning.
    pub fn load_all(&self) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for job_id in self.list()? {
            match self.get(job_id) {
                Ok(job) => jobs.push(job),
                Err(e) => tracing::warn!(job_id, error = %e, "Skipping unreadable job record"),
            }
        }
        Ok(jobs)
    }

    fn update<F>(&self, job_id: JobId, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Job) -> Result<()>,
    {
        let path = self.state.job_path(job_id);
        if !path.exists() {
            return Err(StoreError::JobNotFound(job_id).into());
        }

        locked_update(&path, |content| {
            let mut job: Job = serde_yaml::from_str(content)
                .with_context(|| format!("Failed to parse job record: {}", path.display()))?;
            mutate(&mut job)?;
            serde_yaml::to_string(&job).context("Failed to serialize job record")
        })
    }
}

impl JobRecordStore for FileJobStore {
    fn get(&self, job_id: JobId) -> Result<Job> {
        let path = self.state.job_path(job_id);
        if !path.exists() {
            return Err(StoreError::JobNotFound(job_id).into());
        }

        let content = locked_read(&path)?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse job record: {}", path.display()))
    }

    fn set_status_and_error(
        &self,
        job_id: JobId,
        status: JobStatus,
        error: Option<&str>,
    ) -> Result<()> {
        self.update(job_id, |job| {
            job.status = status;
            if let Some(detail) = error.filter(|d| !d.is_empty()) {
                job.errors.push(ErrorRecord {
                    detail: detail.to_string(),
                    recorded_at: Utc::now(),
                });
            }
            Ok(())
        })
    }

    fn record_stop_time(&self, job_id: JobId, at: DateTime<Utc>) -> Result<()> {
        tracing::info!(job_id, "Recording stop time");
        self.update(job_id, |job| {
            match job.stop_time {
                Some(existing) => {
                    tracing::debug!(job_id, %existing, "Stop time already recorded, keeping it");
                }
                None => job.stop_time = Some(at),
            }
            Ok(())
        })
    }

    fn list(&self) -> Result<Vec<JobId>> {
        let jobs_dir = self.state.jobs_dir();
        if !jobs_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&jobs_dir).with_context(|| {
            format!("Failed to read jobs directory: {}", jobs_dir.display())
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("yaml") {
                continue;
            }
            if let Some(id) = job_id_from_path(&path) {
                ids.push(id);
            }
        }
        ids.sort_unstable();

        Ok(ids)
    }

    fn set_supervisor_pid(&self, job_id: JobId, pid: u32) -> Result<()> {
        self.update(job_id, |job| {
            job.supervisor_pid = Some(pid);
            Ok(())
        })
    }
}
