use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Nonzero failure counts for a job, keyed by `<area>/<name>` category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounters(BTreeMap<String, u64>);

impl FailureCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a category count; zero counts are dropped.
    pub fn insert(&mut self, category: impl Into<String>, count: u64) {
        if count > 0 {
            self.0.insert(category.into(), count);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, category: &str) -> Option<u64> {
        self.0.get(category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, u64)> for FailureCounters {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counters = Self::new();
        for (category, count) in iter {
            counters.insert(category, count);
        }
        counters
    }
}

impl std::fmt::Display for FailureCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Stall detection inputs for a job, both in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTiming {
    /// Time elapsed since the last recorded progress update
    pub no_progress_period: u64,
    /// Maximum tolerated stall
    pub timeout: u64,
}

impl ProgressTiming {
    pub fn is_stalled(&self) -> bool {
        self.no_progress_period > self.timeout
    }
}
