//! Failure-threshold evaluation run on debounced ticks.

use anyhow::{Context, Result};

use crate::models::{FailureCounters, JobId, ProgressTiming};
use crate::store::FailureSignalSource;

/// Why a still-running job must be stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThresholdBreach {
    /// At least one failure counter is nonzero
    FailureCounters(FailureCounters),
    /// Compute nodes failed and the job has stopped making progress
    FailedNodes(u32),
}

impl ThresholdBreach {
    /// Error detail recorded on the job.
    pub fn message(&self) -> String {
        match self {
            ThresholdBreach::FailureCounters(counters) => {
                format!("job terminated with failures: {counters}")
            }
            ThresholdBreach::FailedNodes(count) => {
                format!("job terminated due to {count} failed nodes")
            }
        }
    }
}

/// Number of failed nodes that justify aborting, or 0 to keep going.
///
/// Failed nodes only count once the job has stalled for longer than its
/// progress timeout.
pub fn nodes_to_abort(failed_nodes: u32, timing: ProgressTiming) -> u32 {
    if failed_nodes > 0 && timing.is_stalled() {
        failed_nodes
    } else {
        0
    }
}

/// Read the failed-node count and, only when it is nonzero, the progress timing.
pub fn abort_due_to_failed_nodes(signals: &dyn FailureSignalSource, job_id: JobId) -> Result<u32> {
    let failed_nodes = signals
        .failed_node_count(job_id)
        .with_context(|| format!("Failed to read failed node count for job {job_id}"))?;
    if failed_nodes == 0 {
        return Ok(0);
    }

    let timing = signals
        .progress_timing(job_id)
        .with_context(|| format!("Failed to read progress timing for job {job_id}"))?;
    Ok(nodes_to_abort(failed_nodes, timing))
}

/// Failure counters take precedence over failed nodes.
pub fn check_failure_thresholds(
    signals: &dyn FailureSignalSource,
    job_id: JobId,
) -> Result<Option<ThresholdBreach>> {
    let counters = signals
        .failure_counters(job_id)
        .with_context(|| format!("Failed to read failure counters for job {job_id}"))?;
    if !counters.is_empty() {
        return Ok(Some(ThresholdBreach::FailureCounters(counters)));
    }

    match abort_due_to_failed_nodes(signals, job_id)? {
        0 => Ok(None),
        count => Ok(Some(ThresholdBreach::FailedNodes(count))),
    }
}
