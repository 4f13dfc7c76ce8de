use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Numeric job identity shared by every store.
pub type JobId = u64;

/// A supervised job record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: JobId,
    /// Worker process being supervised
    pub pid: u32,
    /// Process currently running the job's supervisor session
    #[serde(default)]
    pub supervisor_pid: Option<u32>,
    pub status: JobStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub stop_time: Option<DateTime<Utc>>,
    /// Stall timeout override; the configured default applies when unset
    #[serde(default)]
    pub progress_timeout_secs: Option<u64>,
    #[serde(default)]
    pub errors: Vec<ErrorRecord>,
}

/// An error detail attached to a job when it is marked failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorRecord {
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

/// Status of a job in its lifecycle.
///
/// State machine transitions:
/// - `Pending` → `Running` (worker started)
/// - `Running` → `Succeeded` | `Failed`
/// - `Succeeded` and `Failed` are terminal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed),
            other => bail!("Unknown job status '{other}' (expected pending, running, succeeded or failed)"),
        }
    }
}

impl JobStatus {
    /// Check if transitioning from the current status to `new_status` is valid.
    ///
    /// Same status is accepted as a no-op.
    pub fn can_transition_to(&self, new_status: &JobStatus) -> bool {
        if self == new_status {
            return true;
        }

        match self {
            JobStatus::Pending => matches!(new_status, JobStatus::Running),
            JobStatus::Running => matches!(new_status, JobStatus::Succeeded | JobStatus::Failed),
            JobStatus::Succeeded | JobStatus::Failed => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl Job {
    /// Create a pending job record for a freshly launched worker.
    pub fn new(id: JobId, pid: u32) -> Self {
        Self {
            id,
            pid,
            supervisor_pid: None,
            status: JobStatus::Pending,
            start_time: Utc::now(),
            stop_time: None,
            progress_timeout_secs: None,
            errors: Vec::new(),
        }
    }

    /// Most recently recorded error detail, if any.
    pub fn last_error(&self) -> Option<&ErrorRecord> {
        self.errors.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_only_moves_to_running() {
        let status = JobStatus::Pending;
        assert!(status.can_transition_to(&JobStatus::Running));
        assert!(!status.can_transition_to(&JobStatus::Succeeded));
        assert!(!status.can_transition_to(&JobStatus::Failed));
    }

    #[test]
    fn test_running_moves_to_either_terminal_state() {
        let status = JobStatus::Running;
        assert!(status.can_transition_to(&JobStatus::Succeeded));
        assert!(status.can_transition_to(&JobStatus::Failed));
        assert!(!status.can_transition_to(&JobStatus::Pending));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for status in [JobStatus::Succeeded, JobStatus::Failed] {
            assert!(status.is_terminal());
            assert!(!status.can_transition_to(&JobStatus::Running));
            assert!(!status.can_transition_to(&JobStatus::Pending));
        }
        assert!(!JobStatus::Succeeded.can_transition_to(&JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(&JobStatus::Succeeded));
    }

    #[test]
    fn test_status_parses_case_insensitively() {
        assert_eq!("Running".parse::<JobStatus>().unwrap(), JobStatus::Running);
        assert_eq!("failed".parse::<JobStatus>().unwrap(), JobStatus::Failed);
        assert!("done".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_status_yaml_is_lowercase() {
        let yaml = serde_yaml::to_string(&JobStatus::Succeeded).unwrap();
        assert_eq!(yaml.trim(), "succeeded");
    }
}
