//! Store errors that callers branch on.
//!
//! Everything else travels as `anyhow::Error`; these variants are the ones the
//! reconciler and CLI need to tell apart via `downcast_ref`.

use thiserror::Error;

use crate::models::{JobId, JobStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("invalid status transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
}

/// True when `err` (or anything in its chain) is a missing-job error.
pub fn is_job_not_found(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<StoreError>(), Some(StoreError::JobNotFound(_))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_not_found_survives_context() {
        let err = Err::<(), _>(StoreError::JobNotFound(9))
            .context("Failed to load job record")
            .unwrap_err();
        assert!(is_job_not_found(&err));
    }

    #[test]
    fn test_other_errors_are_not_not_found() {
        let err = anyhow::anyhow!("disk on fire");
        assert!(!is_job_not_found(&err));

        let transition: anyhow::Error = StoreError::InvalidTransition {
            job_id: 1,
            from: JobStatus::Failed,
            to: JobStatus::Running,
        }
        .into();
        assert!(!is_job_not_found(&transition));
        assert_eq!(
            transition.to_string(),
            "invalid status transition for job 1: failed -> running"
        );
    }
}
