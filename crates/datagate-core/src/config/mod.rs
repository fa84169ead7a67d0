//! Configuration types for Datagate.
//!
//! Configuration is loaded once at startup from a YAML file (datagate.yaml) and is
//! immutable afterwards. It is shared read-only by every pipeline run.
//!
//! # Configuration Sections
//!
//! - **universe**: the closed table universe (tables, columns, status values, relations),
//!   inline or from `universe_file`
//! - **guardrails**: input limits, model review settings, extra classifier signatures
//! - **pipeline**: timeouts for external calls and result size limits
//! - **llm**: chat-completions endpoint used by the generation stages
//! - **upstream**: read-only PostgreSQL connection
//! - **server**: HTTP bind address

pub mod guardrails;
pub mod llm;
pub mod pipeline;
pub mod universe;
pub mod upstream;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use guardrails::GuardrailsConfig;
pub use llm::LlmConfig;
pub use pipeline::PipelineConfig;
pub use universe::{ColumnRef, Relation, TableDefinition, TableUniverse};
pub use upstream::UpstreamConfig;

/// Complete Datagate configuration loaded from files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatagateConfig {
    /// Project name.
    #[serde(default)]
    pub project: Option<String>,

    /// Configuration version.
    #[serde(default)]
    pub version: Option<String>,

    /// Upstream Postgres connection.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Table universe (inline or from file).
    #[serde(default)]
    pub universe: TableUniverse,

    /// Path to a universe definition file (alternative to inline).
    #[serde(default)]
    pub universe_file: Option<PathBuf>,

    /// Guardrail settings.
    #[serde(default)]
    pub guardrails: GuardrailsConfig,

    /// Pipeline timeouts and limits.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Generation endpoint.
    #[serde(default)]
    pub llm: LlmConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8000"
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DatagateConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration and resolve the universe file, if any.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&content)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(universe_file) = &config.universe_file {
            let universe_path = if universe_file.is_absolute() {
                universe_file.clone()
            } else {
                base_dir.join(universe_file)
            };
            config.universe = TableUniverse::from_file(&universe_path)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.universe.validate()?;
        self.guardrails.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}
