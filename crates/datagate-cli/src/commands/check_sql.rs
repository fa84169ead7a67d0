//! `datagate check-sql`: run the security gate on a statement without executing it.

use anyhow::Result;
use datagate_core::{DatagateConfig, Principal};
use datagate_guard::{GateVerdict, PatternClassifier, SecurityGate};
use datagate_policy::AccessPolicy;
use std::sync::Arc;

pub fn gate_verdict(
    config: &DatagateConfig,
    principal: &Principal,
    question: &str,
    sql: &str,
) -> Result<GateVerdict> {
    let classifier = Arc::new(PatternClassifier::new(&config.guardrails)?);
    let policy = AccessPolicy::new(Arc::new(config.universe.clone()));
    let gate = SecurityGate::new(classifier, policy, &config.guardrails);
    Ok(gate.evaluate(question, sql, None, principal)?)
}

pub fn run_check_sql(
    config: &DatagateConfig,
    principal: &Principal,
    question: &str,
    sql: &str,
) -> Result<()> {
    let verdict = gate_verdict(config, principal, question, sql)?;
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    if let GateVerdict::Rejected(rejection) = verdict {
        anyhow::bail!("rejected: {}", rejection.reason);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    const SAMPLE: &str = include_str!("../../../../config/datagate.yaml");

    #[test]
    fn foreign_join_is_rejected_by_name() {
        let config = DatagateConfig::from_yaml(SAMPLE).unwrap();
        let principal = Principal::user("bob", ["clients"]);

        let verdict = gate_verdict(
            &config,
            &principal,
            "",
            "SELECT * FROM clients c JOIN commandes o ON o.client_id = c.id",
        )
        .unwrap();

        let GateVerdict::Rejected(rejection) = verdict else {
            panic!("expected rejection");
        };
        assert_eq!(
            rejection.tables(),
            Some(&BTreeSet::from(["commandes".to_string()]))
        );
    }

    #[test]
    fn admin_select_is_accepted() {
        let config = DatagateConfig::from_yaml(SAMPLE).unwrap();
        let verdict = gate_verdict(
            &config,
            &Principal::admin("root"),
            "",
            "SELECT nom FROM produits;",
        )
        .unwrap();

        assert_eq!(
            verdict,
            GateVerdict::Accepted {
                sql: "SELECT nom FROM produits".to_string()
            }
        );
    }
}
