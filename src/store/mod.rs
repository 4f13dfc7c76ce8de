//! Collaborator contracts for job state shared across processes.
//!
//! The supervisor and reconciler only see these traits. File-backed
//! implementations live in [`crate::fs`].

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::models::{FailureCounters, Job, JobId, JobStatus, LogMessage, ProgressTiming};

/// Persistent job records: status, error details, timestamps.
pub trait JobRecordStore {
    /// Load a full record. Missing jobs fail with [`crate::error::StoreError::JobNotFound`].
    fn get(&self, job_id: JobId) -> Result<Job>;

    fn status(&self, job_id: JobId) -> Result<JobStatus> {
        Ok(self.get(job_id)?.status)
    }

    /// Overwrite the status and append `error` (when present) to the job's error list.
    fn set_status_and_error(&self, job_id: JobId, status: JobStatus, error: Option<&str>)
        -> Result<()>;

    fn record_stop_time(&self, job_id: JobId, at: DateTime<Utc>) -> Result<()>;

    /// Ids of every stored job, ascending.
    fn list(&self) -> Result<Vec<JobId>>;

    fn set_supervisor_pid(&self, job_id: JobId, pid: u32) -> Result<()>;
}

/// Externally aggregated failure and progress signals for a job.
pub trait FailureSignalSource {
    fn failure_counters(&self, job_id: JobId) -> Result<FailureCounters>;

    fn progress_timing(&self, job_id: JobId) -> Result<ProgressTiming>;

    fn failed_node_count(&self, job_id: JobId) -> Result<u32>;
}

/// Job-scoped cache cleanup.
pub trait CacheReclaimer {
    /// Delete every cache entry of a job.
    ///
    /// Returns the number of entries removed, or `None` when the job has no cache.
    fn reclaim(&self, job_id: JobId) -> Result<Option<usize>>;
}

/// Appends messages to a job's log stream.
pub trait LogPublisher {
    fn publish(&self, job_id: JobId, message: &LogMessage) -> Result<()>;
}
