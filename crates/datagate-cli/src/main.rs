use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ask, check, check_sql, classify, cli_principal, load_config, scope};

#[derive(Parser, Debug)]
#[command(name = "datagate", version, about = "Datagate CLI")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "DATAGATE_CONFIG", default_value = "config/datagate.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

/// Principal the command acts as. Without `--admin`, only `--tables` are readable.
#[derive(clap::Args, Debug)]
struct PrincipalArgs {
    #[arg(long = "as", default_value = "local")]
    id: String,

    /// Grant the whole table universe.
    #[arg(long, default_value_t = false)]
    admin: bool,

    /// Comma-separated tables the principal may read.
    #[arg(long, value_delimiter = ',')]
    tables: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and compile every guardrail signature.
    Check,

    /// Show the guardrail categories a text matches.
    Classify {
        text: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the schema context a principal would see.
    Scope {
        #[command(flatten)]
        principal: PrincipalArgs,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run the security gate on a SQL statement without executing it.
    CheckSql {
        sql: String,
        /// Question the statement answers, pre-checked first.
        #[arg(long, default_value = "")]
        question: String,
        #[command(flatten)]
        principal: PrincipalArgs,
    },

    /// Answer a question using the configured model and database.
    Ask {
        question: String,
        #[arg(long)]
        session: Option<String>,
        /// Print the executed SQL after the answer.
        #[arg(long, default_value_t = false)]
        show_sql: bool,
        #[command(flatten)]
        principal: PrincipalArgs,
    },
}

impl PrincipalArgs {
    fn principal(&self) -> datagate_core::Principal {
        cli_principal(&self.id, self.admin, &self.tables)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Check => check::run_check(&cli.config)?,

        Command::Classify { text, json } => {
            let config = load_config(&cli.config)?;
            classify::run_classify(&config, &text, json)?
        }

        Command::Scope { principal, json } => {
            let config = load_config(&cli.config)?;
            scope::run_scope(&config, &principal.principal(), json)?
        }

        Command::CheckSql {
            sql,
            question,
            principal,
        } => {
            let config = load_config(&cli.config)?;
            check_sql::run_check_sql(&config, &principal.principal(), &question, &sql)?
        }

        Command::Ask {
            question,
            session,
            show_sql,
            principal,
        } => {
            let config = load_config(&cli.config)?;
            ask::run_ask(
                &config,
                &principal.principal(),
                &question,
                session.as_deref(),
                show_sql,
            )
            .await?
        }
    }

    Ok(())
}
