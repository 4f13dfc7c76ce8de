//! JSON-lines job log streams under `<state>/logs/`.

use anyhow::{Context, Result};

use crate::events::LogTailer;
use crate::models::{JobId, LogMessage};
use crate::store::LogPublisher;

use super::locking::locked_append_line;
use super::state_dir::StateDir;

/// Writer side of the per-job log files, and factory for their tailers.
#[derive(Debug, Clone)]
pub struct JobLog {
    state: StateDir,
}

impl JobLog {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }

    /// An event source following this job's log.
    pub fn tailer(&self, job_id: JobId) -> LogTailer {
        LogTailer::new(self.state.job_log_path(job_id))
    }
}

impl LogPublisher for JobLog {
    fn publish(&self, job_id: JobId, message: &LogMessage) -> Result<()> {
        let line = serde_json::to_string(message).context("Failed to serialize log message")?;
        locked_append_line(&self.state.job_log_path(job_id), &line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventSource, Received, RoutingKey};
    use crate::models::Severity;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_published_messages_reach_tailer() {
        let tmp = TempDir::new().unwrap();
        let state = StateDir::new(tmp.path());
        state.initialize().unwrap();
        let log = JobLog::new(state);

        let mut tailer = log.tailer(11);
        tailer.subscribe(&RoutingKey::for_job(11)).unwrap();
        log.publish(11, &LogMessage::new("job.11.worker", Severity::Critical, "disk full"))
            .unwrap();

        match tailer.receive_or_timeout(Duration::from_secs(2)).unwrap() {
            Received::Message(m) => {
                assert_eq!(m.text, "disk full");
                assert_eq!(m.severity, Severity::Critical);
            }
            Received::Timeout => panic!("expected the published message"),
        }
    }
}
