//! Pattern classifier.
//!
//! Signatures are compiled once into one `RegexSet` per category. Matching is
//! case-insensitive and pure; a classifier can be shared across requests.

use datagate_core::{ClassificationCategory, GuardrailsConfig};
use regex::{RegexSet, RegexSetBuilder};
use std::collections::BTreeMap;

use crate::error::GuardError;
use crate::signatures;

// The off-topic table alone compiles to several megabytes once Unicode word
// boundaries and case folding are expanded.
const SET_SIZE_LIMIT: usize = 64 * (1 << 20);

/// First signature of a category that matched a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatch {
    pub category: ClassificationCategory,
    pub index: usize,
    pub pattern: String,
}

/// Stateless matcher over the signature tables.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    sets: BTreeMap<ClassificationCategory, RegexSet>,
}

impl PatternClassifier {
    /// Compile the built-in signatures plus the configured extras.
    pub fn new(config: &GuardrailsConfig) -> Result<Self, GuardError> {
        let mut sets = BTreeMap::new();

        for category in ClassificationCategory::ALL {
            let extras = config
                .extra_signatures
                .get(&category)
                .map(Vec::as_slice)
                .unwrap_or_default();

            for pattern in extras {
                if let Err(source) = regex::Regex::new(pattern) {
                    return Err(GuardError::InvalidSignature {
                        category,
                        pattern: pattern.clone(),
                        source,
                    });
                }
            }

            let patterns = signatures::builtin(category)
                .iter()
                .map(|p| p.to_string())
                .chain(extras.iter().cloned());

            let set = RegexSetBuilder::new(patterns)
                .case_insensitive(true)
                .size_limit(SET_SIZE_LIMIT)
                .build()
                .map_err(|source| GuardError::InvalidSignature {
                    category,
                    pattern: "<set>".to_string(),
                    source,
                })?;

            tracing::debug!(
                category = %category,
                signatures = set.len(),
                "compiled signature set"
            );
            sets.insert(category, set);
        }

        Ok(Self { sets })
    }

    /// Classifier over the built-in tables only.
    pub fn builtin() -> Result<Self, GuardError> {
        Self::new(&GuardrailsConfig::default())
    }

    /// Whether `text` matches any signature of `category`.
    pub fn classify(&self, text: &str, category: ClassificationCategory) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.sets
            .get(&category)
            .is_some_and(|set| set.is_match(text))
    }

    /// Lowest-index signature of `category` matching `text`.
    pub fn first_match(&self, text: &str, category: ClassificationCategory) -> Option<SignatureMatch> {
        if text.trim().is_empty() {
            return None;
        }
        let set = self.sets.get(&category)?;
        let index = set.matches(text).iter().next()?;
        Some(SignatureMatch {
            category,
            index,
            pattern: set.patterns()[index].clone(),
        })
    }

    /// First category of `categories`, in the given order, that `text` matches.
    pub fn classify_any(
        &self,
        text: &str,
        categories: &[ClassificationCategory],
    ) -> Option<SignatureMatch> {
        categories
            .iter()
            .find_map(|category| self.first_match(text, *category))
    }
}
