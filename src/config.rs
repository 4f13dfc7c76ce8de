//! Runtime configuration.
//!
//! Values come from `<state>/config.toml` when present; every field has a
//! default, and CLI flags override what the file says.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::constants::{
    DEFAULT_DEBOUNCE_TICKS, DEFAULT_PROGRESS_TIMEOUT_SECS, DEFAULT_RECEIVE_TIMEOUT_SECS,
    DEFAULT_RECONCILE_INTERVAL_SECS,
};

/// Name of the state directory created under the home directory by default.
pub const DEFAULT_STATE_DIR_NAME: &str = ".jobwarden";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Blocking receive timeout, i.e. the length of one tick
    #[serde(default = "default_receive_timeout_secs")]
    pub receive_timeout_secs: f64,
    /// Ticks between failure-threshold checks
    #[serde(default = "default_debounce_ticks")]
    pub debounce_ticks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Stall timeout for jobs that don't set their own
    #[serde(default = "default_progress_timeout_secs")]
    pub default_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default = "default_reconcile_interval_secs")]
    pub interval_secs: u64,
}

fn default_receive_timeout_secs() -> f64 {
    DEFAULT_RECEIVE_TIMEOUT_SECS
}

fn default_debounce_ticks() -> u32 {
    DEFAULT_DEBOUNCE_TICKS
}

fn default_progress_timeout_secs() -> u64 {
    DEFAULT_PROGRESS_TIMEOUT_SECS
}

fn default_reconcile_interval_secs() -> u64 {
    DEFAULT_RECONCILE_INTERVAL_SECS
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            receive_timeout_secs: DEFAULT_RECEIVE_TIMEOUT_SECS,
            debounce_ticks: DEFAULT_DEBOUNCE_TICKS,
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_PROGRESS_TIMEOUT_SECS,
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_RECONCILE_INTERVAL_SECS,
        }
    }
}

impl SupervisorConfig {
    pub fn receive_timeout(&self) -> Result<Duration> {
        seconds_to_duration(self.receive_timeout_secs)
    }
}

impl Config {
    /// Load `config.toml` from a state directory, falling back to defaults
    /// when the file does not exist.
    pub fn load(state_root: &Path) -> Result<Self> {
        let path = state_root.join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.supervisor.receive_timeout()?;
        if self.supervisor.debounce_ticks == 0 {
            bail!("supervisor.debounce_ticks must be at least 1");
        }
        if self.reconcile.interval_secs == 0 {
            bail!("reconcile.interval_secs must be at least 1");
        }
        Ok(())
    }
}

/// Convert a user-supplied number of seconds into a `Duration`.
pub fn seconds_to_duration(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        bail!("Timeout must be a positive number of seconds, got {secs}");
    }
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("Timeout of {secs} seconds is out of range"))
}

/// Pick the state directory: explicit flag/env value first, then `~/.jobwarden`.
pub fn resolve_state_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DEFAULT_STATE_DIR_NAME))
}
