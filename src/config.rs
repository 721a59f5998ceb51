//! Runtime configuration, passed explicitly to resolver generation and
//! save calls.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::delta::Classification;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Largest batch a resolver accepts before failing.
    pub max_batch_size: usize,
    /// Batches above this size are logged at warn level.
    pub batch_warn_threshold: usize,
    /// Extra commit attempts after a transient store failure.
    pub max_retries: u32,
    /// No new commit attempt starts once this much time has passed.
    pub transaction_timeout_ms: u64,
    /// How entities without a temporary identifier are classified.
    pub classification: Classification,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            batch_warn_threshold: 100,
            max_retries: 0,
            transaction_timeout_ms: 30_000,
            classification: Classification::TempIdsOnly,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}
