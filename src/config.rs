//! Engine configuration.

use crate::domain::error::DomainError;
use crate::domain::values::confidence::ConfidencePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Composite sizes, in base bars. Each symbol is aggregated at every size.
    pub windows: Vec<usize>,

    /// Gate applied to the scorer's label before a candidate is kept.
    pub confidence_policy: ConfidencePolicy,

    /// Pending store/notifier calls held before new ones are dropped.
    pub dispatch_capacity: usize,

    /// Bars queued per symbol before ingestion waits on that symbol.
    pub symbol_queue_capacity: usize,

    /// Retries per store/notifier call after the first attempt.
    pub max_retries: u32,

    /// First retry delay; doubles on each further attempt.
    pub retry_base_delay_ms: u64,

    /// Capacity of the engine event broadcast channel.
    pub event_capacity: usize,

    /// Longest wait for a scorer label; a late label counts as none.
    pub score_timeout_ms: u64,

    /// Send a P/L update for every open signal each time the smallest
    /// window closes.
    pub trade_updates: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            windows: vec![6],
            confidence_policy: ConfidencePolicy::AcceptAll,
            dispatch_capacity: 1024,
            symbol_queue_capacity: 1024,
            max_retries: 3,
            retry_base_delay_ms: 200,
            event_capacity: 1024,
            score_timeout_ms: 5_000,
            trade_updates: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.windows.is_empty() {
            return Err(DomainError::Config("at least one window size is required".into()));
        }
        if self.windows.contains(&0) {
            return Err(DomainError::Config("window sizes must be positive".into()));
        }
        if self.dispatch_capacity == 0 || self.symbol_queue_capacity == 0 || self.event_capacity == 0 {
            return Err(DomainError::Config("queue capacities must be positive".into()));
        }
        if self.score_timeout_ms == 0 {
            return Err(DomainError::Config("score timeout must be positive".into()));
        }
        Ok(())
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn score_timeout(&self) -> Duration {
        Duration::from_millis(self.score_timeout_ms)
    }
}
