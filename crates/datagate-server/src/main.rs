use anyhow::Context;
use clap::Parser;
use datagate_adapter_pg::PostgresExecutor;
use datagate_core::DatagateConfig;
use datagate_guard::{PatternClassifier, SecurityGate};
use datagate_llm::ChatCompletionsClient;
use datagate_policy::{AccessPolicy, PrincipalRegistry};
use datagate_runtime::Orchestrator;
use datagate_server::{router, AppState};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datagate-server", version, about = "Datagate HTTP server")]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, env = "DATAGATE_CONFIG", default_value = "config/datagate.yaml")]
    config: std::path::PathBuf,

    /// Override the bind address from the configuration.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = DatagateConfig::load_with_context(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let universe = Arc::new(config.universe.clone());
    let classifier = Arc::new(PatternClassifier::new(&config.guardrails)?);
    let gate = SecurityGate::new(
        classifier,
        AccessPolicy::new(universe.clone()),
        &config.guardrails,
    );

    let generator = Arc::new(ChatCompletionsClient::from_config(&config.llm)?);
    let executor = Arc::new(PostgresExecutor::connect(&config.upstream, config.pipeline.max_rows).await?);
    let orchestrator = Orchestrator::new(
        generator,
        executor,
        gate,
        &config.pipeline,
        &config.guardrails,
    );

    let state = Arc::new(AppState::new(orchestrator, PrincipalRegistry::new(universe.clone())));
    let app = router(state);

    let addr = args.bind.unwrap_or(config.server.bind);
    tracing::info!(tables = universe.len(), "datagate-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
