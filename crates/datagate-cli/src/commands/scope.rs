//! `datagate scope`: print what the generation instruction shows a principal.

use anyhow::Result;
use datagate_core::{DatagateConfig, Principal};
use datagate_policy::AccessPolicy;
use std::sync::Arc;

pub fn run_scope(config: &DatagateConfig, principal: &Principal, json: bool) -> Result<()> {
    let policy = AccessPolicy::new(Arc::new(config.universe.clone()));
    let schema = policy.scoped_schema(principal);

    if json {
        let value = serde_json::json!({
            "principal": principal.id,
            "tables": schema.table_names().collect::<Vec<_>>(),
            "relations": schema
                .relations
                .iter()
                .map(|r| format!("{}.{} -> {}.{}", r.from_table, r.from_column, r.to_table, r.to_column))
                .collect::<Vec<_>>(),
            "forbidden": schema.forbidden,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if schema.is_empty() {
        println!("'{}' may not read any table.", principal.id);
        return Ok(());
    }
    println!("{}", schema.render_instruction());
    Ok(())
}
