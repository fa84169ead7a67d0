//! Pipeline error types.
//!
//! Rejections are not errors: a refused question ends the run normally with a
//! refusal answer. These are the failures the caller must handle.

use datagate_guard::GuardError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Empty or over-length question.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The principal may not read any table, so generation is pointless.
    #[error("principal '{0}' has no table access")]
    NoTableAccess(String),

    #[error("generation failed: {0}")]
    Generation(#[source] anyhow::Error),

    #[error("execution failed: {0}")]
    Execution(#[source] anyhow::Error),

    /// An external call exceeded its budget. Never retried.
    #[error("{stage} stage timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    /// The gate was driven out of order.
    #[error(transparent)]
    Gate(#[from] GuardError),
}

impl PipelineError {
    /// Stable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "INVALID_INPUT",
            PipelineError::NoTableAccess(_) => "NO_TABLE_ACCESS",
            PipelineError::Generation(_) => "GENERATION_FAILED",
            PipelineError::Execution(_) => "EXECUTION_FAILED",
            PipelineError::Timeout { .. } => "TIMEOUT",
            PipelineError::Gate(_) => "INTERNAL",
        }
    }

    /// Whether the caller caused the failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidInput(_) | PipelineError::NoTableAccess(_)
        )
    }
}
