use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::constants::{JOB_LOGGER_PREFIX, SUPERVISOR_LOGGER_SUFFIX};
use super::job::JobId;

/// Severity of a job log message, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Messages at or above this severity are treated as failure reports.
    pub fn is_failure(&self) -> bool {
        *self >= Severity::Error
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" | "fatal" => Ok(Severity::Critical),
            other => anyhow::bail!("Unknown severity '{other}'"),
        }
    }
}

/// One structured log message delivered on a job's event stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogMessage {
    /// Dotted logger name, e.g. `job.42.worker`
    pub logger: String,
    pub severity: Severity,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl LogMessage {
    pub fn new(logger: impl Into<String>, severity: Severity, text: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
            severity,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Root logger name of a job's namespace (`job.<id>`).
pub fn job_logger_name(job_id: JobId) -> String {
    format!("{JOB_LOGGER_PREFIX}.{job_id}")
}

/// Name of the supervisor's own diagnostic logger for a job.
pub fn supervisor_logger_name(job_id: JobId) -> String {
    format!("{}.{SUPERVISOR_LOGGER_SUFFIX}", job_logger_name(job_id))
}

/// Shorten a logger name for display by dropping the job namespace.
///
/// `job.7.worker.io` becomes `worker.io`; the namespace root itself becomes `root`.
/// Names outside the namespace are returned unchanged.
pub fn display_logger_name(job_id: JobId, logger: &str) -> String {
    let prefix = job_logger_name(job_id);
    match logger.strip_prefix(&prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('.') => {
            let rest = rest.trim_start_matches('.');
            if rest.is_empty() {
                "root".to_string()
            } else {
                rest.to_string()
            }
        }
        _ => logger.to_string(),
    }
}
