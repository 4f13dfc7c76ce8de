//! Subcommand implementations for the `jobwarden` and `cache-gc` binaries.

pub mod cache;
pub mod job;
pub mod reconcile;
pub mod report;
pub mod supervise;

use colored::{ColoredString, Colorize};

use crate::models::JobStatus;

/// Status rendered for terminal listings.
pub(crate) fn colored_status(status: JobStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        JobStatus::Pending => text.dimmed(),
        JobStatus::Running => text.cyan(),
        JobStatus::Succeeded => text.green(),
        JobStatus::Failed => text.red(),
    }
}
