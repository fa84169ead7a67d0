//! `datagate ask`: answer one question end to end against the configured
//! model and database.

use anyhow::Result;
use datagate_adapter_pg::PostgresExecutor;
use datagate_core::{DatagateConfig, Principal};
use datagate_guard::{PatternClassifier, SecurityGate};
use datagate_llm::ChatCompletionsClient;
use datagate_policy::AccessPolicy;
use datagate_runtime::Orchestrator;
use std::sync::Arc;

pub async fn run_ask(
    config: &DatagateConfig,
    principal: &Principal,
    question: &str,
    session_id: Option<&str>,
    show_sql: bool,
) -> Result<()> {
    let universe = Arc::new(config.universe.clone());
    let classifier = Arc::new(PatternClassifier::new(&config.guardrails)?);
    let gate = SecurityGate::new(classifier, AccessPolicy::new(universe), &config.guardrails);

    let generator = Arc::new(ChatCompletionsClient::from_config(&config.llm)?);
    let executor =
        Arc::new(PostgresExecutor::connect(&config.upstream, config.pipeline.max_rows).await?);
    let orchestrator = Orchestrator::new(
        generator,
        executor,
        gate,
        &config.pipeline,
        &config.guardrails,
    );

    let outcome = orchestrator.run(question, principal, session_id).await?;

    println!("{}", outcome.answer);
    if show_sql && let Some(sql) = &outcome.sql {
        println!("\n-- SQL\n{}", sql);
    }
    if let Some(rejection) = &outcome.rejection {
        tracing::debug!(reason = %rejection.reason, "question refused");
    }
    eprintln!("session: {}", outcome.session_id);
    Ok(())
}
