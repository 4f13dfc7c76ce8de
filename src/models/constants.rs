/// Default timeout for a single blocking receive on the job's event stream.
/// One receive timeout is one supervisor "tick".
pub const DEFAULT_RECEIVE_TIMEOUT_SECS: f64 = 1.0;

/// Number of ticks between failure-threshold checks.
/// With the default receive timeout this is roughly one check per minute.
pub const DEFAULT_DEBOUNCE_TICKS: u32 = 60;

/// Default maximum tolerated stall (seconds without recorded progress).
pub const DEFAULT_PROGRESS_TIMEOUT_SECS: u64 = 3600;

/// Default interval between reconciliation scans in watch mode.
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 30;

/// Prefix of every job-scoped logger name (`job.<id>`, `job.<id>.worker`, ...).
pub const JOB_LOGGER_PREFIX: &str = "job";

/// Suffix of the supervisor's own diagnostic logger under the job namespace.
pub const SUPERVISOR_LOGGER_SUFFIX: &str = "supervisor";

/// Counter names ending with this tag are failure categories.
pub const FAILURE_COUNTER_TAG: &str = ":failed";
