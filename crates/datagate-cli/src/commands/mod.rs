//! CLI command implementations.

pub mod ask;
pub mod check;
pub mod check_sql;
pub mod classify;
pub mod scope;

use anyhow::Context;
use datagate_core::{DatagateConfig, Principal};

/// Principal described on the command line: `--admin` or an explicit table list.
pub fn cli_principal(id: &str, admin: bool, tables: &[String]) -> Principal {
    if admin {
        Principal::admin(id)
    } else {
        Principal::user(id, tables.iter().map(|t| t.trim()))
    }
}

pub fn load_config(path: &std::path::Path) -> anyhow::Result<DatagateConfig> {
    DatagateConfig::load_with_context(path)
        .with_context(|| format!("failed to load {}", path.display()))
}
