//! Pipeline timeouts and limits.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound for one call to the generation service.
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    /// Upper bound for one call to the execution service.
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_secs: u64,

    /// Rows handed to the formatting stage at most.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: default_generation_timeout(),
            execution_timeout_secs: default_execution_timeout(),
            max_rows: default_max_rows(),
        }
    }
}

impl PipelineConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation_timeout_secs == 0 || self.execution_timeout_secs == 0 {
            return Err(ConfigError::Config(
                "pipeline timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_generation_timeout() -> u64 {
    60
}

fn default_execution_timeout() -> u64 {
    30
}

fn default_max_rows() -> usize {
    500
}
