use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::is_job_not_found;
use crate::models::{JobId, JobStatus};
use crate::process::ProcessController;
use crate::store::JobRecordStore;

use super::launcher::SessionLauncher;

/// How often the watch loop wakes up to check for shutdown while waiting.
const SHUTDOWN_POLL_MS: u64 = 100;

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub scanned: usize,
    /// `(job_id, supervisor_pid)` for every session launched
    pub launched: Vec<(JobId, u32)>,
    /// Jobs that could not be reconciled, with the error chain
    pub errors: Vec<(JobId, String)>,
}

/// Finds running jobs that lost their supervisor and starts a new one.
pub struct ReconciliationScanner<'a> {
    jobs: &'a dyn JobRecordStore,
    processes: &'a dyn ProcessController,
    launcher: &'a dyn SessionLauncher,
}

impl<'a> ReconciliationScanner<'a> {
    pub fn new(
        jobs: &'a dyn JobRecordStore,
        processes: &'a dyn ProcessController,
        launcher: &'a dyn SessionLauncher,
    ) -> Self {
        Self {
            jobs,
            processes,
            launcher,
        }
    }

    /// One pass over every job record.
    ///
    /// Only listing the jobs can fail the scan; per-job failures are collected
    /// in the report.
    pub fn scan(&self) -> Result<ScanReport> {
        let job_ids = self.jobs.list().context("Failed to list job records")?;
        let mut report = ScanReport::default();

        for job_id in job_ids {
            report.scanned += 1;
            match self.reconcile_job(job_id) {
                Ok(Some(pid)) => report.launched.push((job_id, pid)),
                Ok(None) => {}
                Err(e) if is_job_not_found(&e) => {
                    tracing::debug!(job_id, "Job record disappeared during scan");
                }
                Err(e) => {
                    tracing::warn!(job_id, error = %format!("{e:#}"), "Failed to reconcile job");
                    report.errors.push((job_id, format!("{e:#}")));
                }
            }
        }

        Ok(report)
    }

    fn reconcile_job(&self, job_id: JobId) -> Result<Option<u32>> {
        let job = self.jobs.get(job_id)?;
        if job.status != JobStatus::Running {
            return Ok(None);
        }

        if let Some(supervisor_pid) = job.supervisor_pid {
            if self.processes.is_alive(supervisor_pid) {
                return Ok(None);
            }
        }

        tracing::info!(
            job_id,
            pid = job.pid,
            supervisor_pid = ?job.supervisor_pid,
            "Launching supervisor for orphaned job"
        );

        let launched = self.launcher.launch(job_id, job.pid)?;
        self.jobs
            .set_supervisor_pid(job_id, launched)
            .with_context(|| format!("Failed to record supervisor pid {launched} for job {job_id}"))?;

        Ok(Some(launched))
    }

    /// Scan every `interval` until `running` is cleared.
    ///
    /// Exited sessions are reaped before each pass. A failed pass is logged
    /// and retried on the next interval.
    pub fn watch<F>(&self, interval: Duration, running: &AtomicBool, mut on_report: F)
    where
        F: FnMut(&ScanReport),
    {
        while running.load(Ordering::SeqCst) {
            let reaped = self.launcher.reap_exited();
            if reaped > 0 {
                tracing::debug!(reaped, "Reaped exited supervisors");
            }

            match self.scan() {
                Ok(report) => on_report(&report),
                Err(e) => tracing::error!(error = %format!("{e:#}"), "Reconciliation scan failed"),
            }

            let deadline = Instant::now() + interval;
            while running.load(Ordering::SeqCst) && Instant::now() < deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                thread::sleep(remaining.min(Duration::from_millis(SHUTDOWN_POLL_MS)));
            }
        }
    }
}
