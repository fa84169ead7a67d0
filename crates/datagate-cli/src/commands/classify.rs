//! `datagate classify`: show which guardrail categories a text falls into.

use anyhow::Result;
use datagate_core::{ClassificationCategory, DatagateConfig};
use datagate_guard::{PatternClassifier, SignatureMatch, PRE_CHECK_ORDER};

pub fn run_classify(config: &DatagateConfig, text: &str, json: bool) -> Result<()> {
    let classifier = PatternClassifier::new(&config.guardrails)?;
    let matches = classify_all(&classifier, text);

    if json {
        let value: Vec<_> = matches
            .iter()
            .map(|m| {
                serde_json::json!({
                    "category": m.category,
                    "index": m.index,
                    "pattern": m.pattern,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("no match");
        return Ok(());
    }
    for (i, m) in matches.iter().enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        println!("{} {:<20} #{:<3} {}", marker, m.category.as_str(), m.index, m.pattern);
    }
    println!("\n* decides the pre-check verdict");
    Ok(())
}

/// Matches in pre-check priority order.
pub fn classify_all(classifier: &PatternClassifier, text: &str) -> Vec<SignatureMatch> {
    PRE_CHECK_ORDER
        .iter()
        .filter_map(|c: &ClassificationCategory| classifier.first_match(text, *c))
        .collect()
}
