use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// Configuration types shared across all Datagate crates
pub mod config;

pub use config::{
    ColumnRef, ConfigError, DatagateConfig, GuardrailsConfig, LlmConfig, PipelineConfig,
    Relation, ServerConfig, TableDefinition, TableUniverse, UpstreamConfig,
};

/// Access role of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(ConfigError::Config(format!(
                "unknown role '{}' (expected 'user' or 'admin')",
                other
            ))),
        }
    }
}

/// Authenticated caller of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    #[serde(default)]
    pub role: Role,
    /// Stored table set. Ignored for admins, who always see the full universe.
    #[serde(default)]
    pub allowed_tables: BTreeSet<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role, allowed_tables: BTreeSet<String>) -> Self {
        Self {
            id: id.into(),
            role,
            allowed_tables,
        }
    }

    /// Convenience constructor for a non-admin principal.
    pub fn user<I, S>(id: impl Into<String>, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            Role::User,
            tables.into_iter().map(|t| t.into().to_lowercase()).collect(),
        )
    }

    /// Convenience constructor for an admin principal.
    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, Role::Admin, BTreeSet::new())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Tables this principal may actually query: the whole universe for admins,
    /// otherwise the stored set restricted to known tables.
    pub fn effective_tables(&self, universe: &TableUniverse) -> BTreeSet<String> {
        if self.is_admin() {
            return universe.table_names().map(str::to_string).collect();
        }
        self.allowed_tables
            .iter()
            .filter(|t| universe.contains(t))
            .cloned()
            .collect()
    }
}

/// Guardrail categories a piece of text can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationCategory {
    Greeting,
    OffTopic,
    DestructiveIntent,
    PromptInjection,
    SqlInjection,
}

impl ClassificationCategory {
    pub const ALL: [ClassificationCategory; 5] = [
        ClassificationCategory::Greeting,
        ClassificationCategory::OffTopic,
        ClassificationCategory::DestructiveIntent,
        ClassificationCategory::PromptInjection,
        ClassificationCategory::SqlInjection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationCategory::Greeting => "greeting",
            ClassificationCategory::OffTopic => "off_topic",
            ClassificationCategory::DestructiveIntent => "destructive_intent",
            ClassificationCategory::PromptInjection => "prompt_injection",
            ClassificationCategory::SqlInjection => "sql_injection",
        }
    }
}

impl fmt::Display for ClassificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
