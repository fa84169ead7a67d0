//! Upstream database configuration types.
//!
//! Three configuration methods are supported, in order of precedence:
//! 1. `database_url_env` - reference an environment variable
//! 2. `database_url` - provide the URL directly
//! 3. Individual fields (host, port, database, username, password)

use serde::{Deserialize, Serialize};

/// Configuration for the read-only Postgres connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Environment variable name containing the PostgreSQL connection URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url_env: Option<String>,

    /// Full PostgreSQL connection URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Server-side `statement_timeout` applied to every query.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            database_url_env: None,
            database_url: None,
            host: default_host(),
            port: default_port(),
            database: default_database(),
            username: default_username(),
            password: None,
            password_env: None,
            max_connections: default_max_connections(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

impl UpstreamConfig {
    /// Build a PostgreSQL connection string from this configuration.
    pub fn connection_string(&self) -> String {
        if let Some(env_var) = &self.database_url_env
            && let Ok(url) = std::env::var(env_var)
        {
            return url;
        }

        if let Some(url) = &self.database_url {
            return url.clone();
        }

        match self.password() {
            Some(password) => format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.username, password, self.host, self.port, self.database
            ),
            None => format!(
                "postgresql://{}@{}:{}/{}",
                self.username, self.host, self.port, self.database
            ),
        }
    }

    fn password(&self) -> Option<String> {
        if let Some(env_var) = &self.password_env
            && let Ok(password) = std::env::var(env_var)
        {
            return Some(password);
        }
        self.password.clone()
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_database() -> String {
    "postgres".to_string()
}

fn default_username() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_statement_timeout_ms() -> u64 {
    15_000
}
