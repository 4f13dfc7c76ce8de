//! Fleet-wide recovery of jobs whose supervisor died.

mod launcher;
mod scanner;

pub use launcher::{ProcessLauncher, SessionLauncher};
pub use scanner::{ReconciliationScanner, ScanReport};
