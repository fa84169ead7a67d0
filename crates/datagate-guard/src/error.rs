//! Error types for the guard crate.

use datagate_core::ClassificationCategory;
use thiserror::Error;

use crate::gate::GateState;

/// Errors raised while building or driving the guardrails.
///
/// Rejections are not errors: they are reported through `GateVerdict`.
#[derive(Debug, Error)]
pub enum GuardError {
    /// A configured signature does not compile.
    #[error("invalid {category} signature '{pattern}': {source}")]
    InvalidSignature {
        category: ClassificationCategory,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The gate was driven out of order.
    #[error("illegal gate transition from {from} to {to}")]
    IllegalTransition { from: GateState, to: GateState },
}
