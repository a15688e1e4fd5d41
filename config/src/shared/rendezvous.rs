use serde::Deserialize;
use std::time::Duration;

use crate::shared::ValidationError;

/// Default name of the protected branch pull requests are merged into.
const DEFAULT_PROTECTED_BRANCH: &str = "Master";

/// Settings for the pull request / merge rendezvous session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RendezvousConfig {
    /// Branch that approved pull requests are merged into.
    #[serde(default = "default_protected_branch")]
    pub protected_branch: String,
    /// Simulated review time spent by the approving task before each step, in milliseconds.
    #[serde(default)]
    pub processing_delay_ms: u64,
}

fn default_protected_branch() -> String {
    DEFAULT_PROTECTED_BRANCH.to_string()
}

impl RendezvousConfig {
    /// Validates the rendezvous settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.protected_branch.trim().is_empty() {
            return Err(ValidationError::ProtectedBranchEmpty);
        }

        Ok(())
    }

    /// Returns the simulated processing delay.
    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        Self {
            protected_branch: default_protected_branch(),
            processing_delay_ms: 0,
        }
    }
}
