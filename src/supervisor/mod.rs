//! Per-job watchdog.
//!
//! A [`SupervisorSession`] follows one job from the moment its worker starts
//! until the job is finalized: status written, stop time recorded and cache
//! reclaimed.

mod debounce;
mod session;
mod thresholds;


pub use debounce::Debounce;
pub use session::{Collaborators, SessionConfig, SupervisorSession, Termination};
pub use thresholds::{
    abort_due_to_failed_nodes, check_failure_thresholds, nodes_to_abort, ThresholdBreach,
};
