use serde::Deserialize;
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use crate::shared::ValidationError;

/// Settings for the task runners that execute units of work in the background.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// Number of reusable workers in the pool. Defaults to the number of available processors.
    #[serde(default)]
    pub pool_size: Option<u16>,
    /// Number of jobs that can wait in the pool queue. Defaults to the pool size.
    #[serde(default)]
    pub queue_capacity: Option<u16>,
    /// Deadline applied to every service call, in milliseconds. No deadline when absent.
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
}

impl RunnerConfig {
    /// Validates the runner settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pool_size == Some(0) {
            return Err(ValidationError::PoolSizeZero);
        }

        if self.queue_capacity == Some(0) {
            return Err(ValidationError::QueueCapacityZero);
        }

        if self.call_timeout_ms == Some(0) {
            return Err(ValidationError::CallTimeoutZero);
        }

        Ok(())
    }

    /// Returns the resolved pool size.
    ///
    /// Falls back to the number of available processors, and to one worker when that cannot be
    /// determined. A configured zero is treated as one; [`RunnerConfig::validate`] rejects it earlier.
    pub fn pool_size(&self) -> NonZeroUsize {
        match self.pool_size {
            Some(size) => NonZeroUsize::new(size as usize).unwrap_or(NonZeroUsize::MIN),
            None => thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Returns the resolved job queue capacity, defaulting to the pool size.
    pub fn queue_capacity(&self) -> NonZeroUsize {
        self.queue_capacity
            .and_then(|capacity| NonZeroUsize::new(capacity as usize))
            .unwrap_or_else(|| self.pool_size())
    }

    /// Returns the per-call deadline, if one is configured.
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}
