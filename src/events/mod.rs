//! Push-based job log streams.
//!
//! The supervisor consumes log messages through [`EventSource`]: subscribe to
//! a job's [`RoutingKey`], then block on [`EventSource::receive_or_timeout`].
//! How messages travel (a tailed file, an in-process channel) is up to the
//! implementation.

mod channel;
mod tailer;

use anyhow::Result;
use std::time::Duration;

use crate::models::log_message::job_logger_name;
use crate::models::{JobId, LogMessage};

pub use channel::ChannelSource;
pub use tailer::LogTailer;

/// Result of one blocking receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Message(LogMessage),
    Timeout,
}

/// A job-filtered stream of log messages.
pub trait EventSource {
    /// Start delivering messages whose logger matches `key`.
    fn subscribe(&mut self, key: &RoutingKey) -> Result<()>;

    /// Block until a matching message arrives or `timeout` expires.
    fn receive_or_timeout(&mut self, timeout: Duration) -> Result<Received>;

    /// Stop delivery and release any background resources.
    fn unsubscribe(&mut self) {}
}

/// Selects every logger in a job's namespace: `job.<id>` and `job.<id>.*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingKey {
    namespace: String,
}

impl RoutingKey {
    pub fn for_job(job_id: JobId) -> Self {
        Self {
            namespace: job_logger_name(job_id),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn matches(&self, logger: &str) -> bool {
        match logger.strip_prefix(self.namespace.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}

impl std::fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.#", self.namespace)
    }
}
