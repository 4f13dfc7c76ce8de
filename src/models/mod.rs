pub mod constants;
pub mod job;
pub mod log_message;
pub mod signals;

pub use job::{ErrorRecord, Job, JobId, JobStatus};
pub use log_message::{LogMessage, Severity};
pub use signals::{FailureCounters, ProgressTiming};
