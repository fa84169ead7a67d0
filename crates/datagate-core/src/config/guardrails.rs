//! Guardrail settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ConfigError;
use crate::ClassificationCategory;

/// Settings for the classifiers and the security gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailsConfig {
    /// Longest question accepted, in characters.
    #[serde(default = "default_max_question_chars")]
    pub max_question_chars: usize,

    /// Whether generated SQL is also sent to a model-based security review.
    #[serde(default = "default_true")]
    pub review_enabled: bool,

    /// Marker a review answer contains when it rejects the SQL.
    #[serde(default = "default_review_marker")]
    pub review_rejection_marker: String,

    /// Additional signatures appended after the built-in ones, per category.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_signatures: BTreeMap<ClassificationCategory, Vec<String>>,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            max_question_chars: default_max_question_chars(),
            review_enabled: true,
            review_rejection_marker: default_review_marker(),
            extra_signatures: BTreeMap::new(),
        }
    }
}

impl GuardrailsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_question_chars == 0 {
            return Err(ConfigError::Config(
                "guardrails.max_question_chars must be greater than zero".to_string(),
            ));
        }
        if self.review_enabled && self.review_rejection_marker.trim().is_empty() {
            return Err(ConfigError::Config(
                "guardrails.review_rejection_marker cannot be empty when review is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_max_question_chars() -> usize {
    1000
}

fn default_review_marker() -> String {
    "REJETÉE".to_string()
}
