//! `datagate check`: validate the configuration and compile every signature.

use anyhow::Result;
use datagate_core::{ClassificationCategory, DatagateConfig};
use datagate_guard::PatternClassifier;
use datagate_policy::AccessPolicy;
use std::path::Path;
use std::sync::Arc;

/// One line of the check report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckLine {
    pub ok: bool,
    pub message: String,
}

pub fn run_check(config_path: &Path) -> Result<()> {
    let config = super::load_config(config_path)?;
    let lines = check_config(&config);

    for line in &lines {
        let tag = if line.ok { "OK  " } else { "FAIL" };
        println!("[{}] {}", tag, line.message);
    }

    if lines.iter().any(|l| !l.ok) {
        anyhow::bail!("configuration check failed");
    }
    println!("\n{} is valid.", config_path.display());
    Ok(())
}

pub fn check_config(config: &DatagateConfig) -> Vec<CheckLine> {
    let mut lines = Vec::new();

    let universe = Arc::new(config.universe.clone());
    lines.push(CheckLine {
        ok: !universe.is_empty(),
        message: format!(
            "{} tables, {} relations",
            universe.len(),
            universe.relations().len()
        ),
    });

    match PatternClassifier::new(&config.guardrails) {
        Ok(_) => {
            let extras: usize = config.guardrails.extra_signatures.values().map(Vec::len).sum();
            lines.push(CheckLine {
                ok: true,
                message: format!(
                    "{} signature categories compiled ({} extra patterns)",
                    ClassificationCategory::ALL.len(),
                    extras
                ),
            });
        }
        Err(e) => lines.push(CheckLine {
            ok: false,
            message: e.to_string(),
        }),
    }

    let schema = AccessPolicy::new(universe).scoped_schema(&datagate_core::Principal::admin("check"));
    lines.push(CheckLine {
        ok: schema.forbidden.is_empty(),
        message: format!("admin scope covers {} tables", schema.tables.len()),
    });

    lines.push(CheckLine {
        ok: true,
        message: format!(
            "review {}",
            if config.guardrails.review_enabled {
                "enabled"
            } else {
                "disabled"
            }
        ),
    });

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const SAMPLE: &str = include_str!("../../../../config/datagate.yaml");

    #[test]
    fn sample_config_checks_clean() {
        let config = DatagateConfig::from_yaml(SAMPLE).unwrap();
        assert!(check_config(&config).iter().all(|l| l.ok));
    }

    #[test]
    fn broken_extra_signature_fails() {
        let mut config = DatagateConfig::from_yaml(SAMPLE).unwrap();
        config.guardrails.extra_signatures = BTreeMap::from([(
            ClassificationCategory::OffTopic,
            vec!["(unclosed".to_string()],
        )]);

        let lines = check_config(&config);
        assert!(lines.iter().any(|l| !l.ok && l.message.contains("(unclosed")));
    }
}
