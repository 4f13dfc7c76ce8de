//! File-backed implementations of the job state collaborators.
//!
//! Everything lives under one state directory shared by workers, supervisors
//! and the reconciler; see [`StateDir`] for the layout.

pub mod cache;
pub mod job_log;
pub mod job_store;
pub mod locking;
pub mod signals;
pub mod state_dir;

pub use cache::FileCache;
pub use job_log::JobLog;
pub use job_store::FileJobStore;
pub use signals::{FileSignals, JobStats};
pub use state_dir::StateDir;
