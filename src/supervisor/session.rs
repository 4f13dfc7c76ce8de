use anyhow::{Context, Result};
use chrono::Utc;
use std::time::{Duration, Instant};

use crate::config::SupervisorConfig;
use crate::events::{EventSource, Received, RoutingKey};
use crate::models::constants::{DEFAULT_DEBOUNCE_TICKS, DEFAULT_RECEIVE_TIMEOUT_SECS};
use crate::models::log_message::{display_logger_name, supervisor_logger_name};
use crate::models::{JobId, JobStatus, LogMessage, Severity};
use crate::process::ProcessController;
use crate::store::{CacheReclaimer, FailureSignalSource, JobRecordStore, LogPublisher};

use super::debounce::Debounce;
use super::thresholds::{check_failure_thresholds, ThresholdBreach};

/// Loop timing for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Length of one tick: how long a receive blocks before polling
    pub receive_timeout: Duration,
    /// Ticks between failure-threshold checks
    pub debounce_threshold: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            receive_timeout: Duration::from_secs_f64(DEFAULT_RECEIVE_TIMEOUT_SECS),
            debounce_threshold: DEFAULT_DEBOUNCE_TICKS,
        }
    }
}

impl SessionConfig {
    pub fn from_config(config: &SupervisorConfig) -> Result<Self> {
        Ok(Self {
            receive_timeout: config.receive_timeout()?,
            debounce_threshold: config.debounce_ticks,
        })
    }

    /// Time between two failure-threshold checks.
    pub fn check_interval(&self) -> Duration {
        self.receive_timeout
            .saturating_mul(self.debounce_threshold.max(1))
    }
}

/// Shared stores a session reads and writes.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub processes: &'a dyn ProcessController,
    pub jobs: &'a dyn JobRecordStore,
    pub signals: &'a dyn FailureSignalSource,
    pub cache: &'a dyn CacheReclaimer,
    /// Where the session mirrors its own diagnostics, if anywhere
    pub publisher: Option<&'a dyn LogPublisher>,
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The job logged an error; its text became the job's error detail
    ReportedFailure { logger: String, message: String },
    /// The worker exited on its own; `status` is what the job record said at that point
    ProcessStopped { status: JobStatus },
    /// Failure counters or failed nodes crossed their threshold
    ThresholdExceeded(ThresholdBreach),
}

impl Termination {
    /// Whether the session considers the job failed.
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            Termination::ProcessStopped {
                status: JobStatus::Succeeded
            }
        )
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::ReportedFailure { logger, message } => {
                write!(f, "reported failure from {logger}: {message}")
            }
            Termination::ProcessStopped { status } => {
                write!(f, "process stopped with status {status}")
            }
            Termination::ThresholdExceeded(breach) => write!(f, "{}", breach.message()),
        }
    }
}

/// Watchdog for a single job.
///
/// Blocks on the job's log stream; error-level messages fail the job at
/// once, and every receive timeout counts as a tick that polls the worker's
/// liveness and, once per debounce window, the failure thresholds.
pub struct SupervisorSession<'a> {
    job_id: JobId,
    job_pid: u32,
    config: SessionConfig,
    stores: Collaborators<'a>,
    events: &'a mut dyn EventSource,
    self_logger: String,
    debounce: Debounce,
    termination: Option<Termination>,
}

impl<'a> SupervisorSession<'a> {
    pub fn new(
        job_id: JobId,
        job_pid: u32,
        config: SessionConfig,
        stores: Collaborators<'a>,
        events: &'a mut dyn EventSource,
    ) -> Self {
        Self {
            job_id,
            job_pid,
            config,
            stores,
            events,
            self_logger: supervisor_logger_name(job_id),
            debounce: Debounce::new(config.debounce_threshold),
            termination: None,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.termination.is_some()
    }

    #[cfg(test)]
    pub(crate) fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    /// Run the watchdog loop until the job is finalized.
    pub fn run(&mut self) -> Result<Termination> {
        let span = tracing::info_span!("supervisor", job_id = self.job_id, job_pid = self.job_pid);
        let _entered = span.enter();

        let key = RoutingKey::for_job(self.job_id);
        self.events
            .subscribe(&key)
            .with_context(|| format!("Failed to subscribe to log stream {key}"))?;

        tracing::info!(routing_key = %key, "Entering supervisor for job {}", self.job_id);
        let started = Instant::now();

        let outcome = self.run_loop();
        self.events.unsubscribe();

        tracing::info!(
            "Job {} finished in {:.1}s",
            self.job_id,
            started.elapsed().as_secs_f64()
        );
        tracing::info!("Exiting supervisor for job {}", self.job_id);

        outcome
    }

    fn run_loop(&mut self) -> Result<Termination> {
        loop {
            if let Some(termination) = self.termination.clone() {
                return Ok(termination);
            }

            match self.events.receive_or_timeout(self.config.receive_timeout)? {
                Received::Message(message) => self.handle_message(&message)?,
                Received::Timeout => self.handle_tick()?,
            }
        }
    }

    /// React to one log message from the job's namespace.
    pub fn handle_message(&mut self, message: &LogMessage) -> Result<()> {
        if self.is_stopped() || message.logger == self.self_logger {
            return Ok(());
        }

        if !message.severity.is_failure() {
            self.relay(message);
            return Ok(());
        }

        tracing::error!(
            logger = %message.logger,
            severity = %message.severity,
            "Job reported a failure: {}",
            message.text
        );

        self.stores.processes.terminate(self.job_pid)?;
        self.stores
            .jobs
            .set_status_and_error(self.job_id, JobStatus::Failed, Some(&message.text))
            .with_context(|| format!("Failed to mark job {} as failed", self.job_id))?;

        self.finalize(Termination::ReportedFailure {
            logger: message.logger.clone(),
            message: message.text.clone(),
        })
    }

    /// Poll the worker after a receive timeout.
    pub fn handle_tick(&mut self) -> Result<()> {
        if self.is_stopped() {
            return Ok(());
        }

        let process_stopped = !self.stores.processes.is_alive(self.job_pid);

        let breach = if process_stopped {
            None
        } else if self.debounce.tick() {
            let breach = check_failure_thresholds(self.stores.signals, self.job_id)?;
            if breach.is_some() {
                self.stores.processes.terminate(self.job_pid)?;
            }
            breach
        } else {
            None
        };

        if !process_stopped && breach.is_none() {
            return Ok(());
        }

        let message = match &breach {
            Some(breach) => breach.message(),
            None => format!("job process {} crashed or terminated", self.job_pid),
        };

        let status = self
            .stores
            .jobs
            .status(self.job_id)
            .with_context(|| format!("Failed to read status of job {}", self.job_id))?;

        if process_stopped && status == JobStatus::Succeeded {
            let text = format!("job process {} succeeded", self.job_pid);
            tracing::info!("{text}");
            self.mirror(Severity::Info, &text);
        } else if status == JobStatus::Running {
            tracing::error!("{message}");
            self.mirror(Severity::Error, &message);
            self.stores
                .jobs
                .set_status_and_error(self.job_id, JobStatus::Failed, Some(&message))
                .with_context(|| format!("Failed to mark job {} as failed", self.job_id))?;
        }

        let termination = match breach {
            Some(breach) => Termination::ThresholdExceeded(breach),
            None => Termination::ProcessStopped { status },
        };
        self.finalize(termination)
    }

    fn finalize(&mut self, termination: Termination) -> Result<()> {
        self.stores
            .jobs
            .record_stop_time(self.job_id, Utc::now())
            .with_context(|| format!("Failed to record stop time of job {}", self.job_id))?;

        match self
            .stores
            .cache
            .reclaim(self.job_id)
            .with_context(|| format!("Failed to reclaim cache of job {}", self.job_id))?
        {
            Some(removed) => tracing::info!(removed, "Reclaimed job cache"),
            None => tracing::debug!("No cache entries to reclaim"),
        }

        self.termination = Some(termination);
        Ok(())
    }

    fn relay(&self, message: &LogMessage) {
        let logger = display_logger_name(self.job_id, &message.logger);
        let text = &message.text;
        match message.severity {
            Severity::Trace => tracing::trace!(%logger, "{text}"),
            Severity::Debug => tracing::debug!(%logger, "{text}"),
            Severity::Info => tracing::info!(%logger, "{text}"),
            Severity::Warning => tracing::warn!(%logger, "{text}"),
            Severity::Error | Severity::Critical => tracing::error!(%logger, "{text}"),
        }
    }

    fn mirror(&self, severity: Severity, text: &str) {
        let Some(publisher) = self.stores.publisher else {
            return;
        };
        let message = LogMessage::new(self.self_logger.clone(), severity, text);
        if let Err(e) = publisher.publish(self.job_id, &message) {
            tracing::warn!(error = %e, "Failed to publish supervisor diagnostic");
        }
    }
}
