//! Principal lifecycle.
//!
//! Principals are created at registration and mutated only through admin
//! actions. The first principal ever registered becomes admin. Every new
//! principal starts with the full universe as its stored table set; admins
//! narrow it afterwards. Principals are never deleted.

use crate::error::PolicyError;
use datagate_core::{Principal, Role, TableUniverse};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// In-memory principal store.
#[derive(Debug)]
pub struct PrincipalRegistry {
    universe: Arc<TableUniverse>,
    principals: BTreeMap<String, Principal>,
}

impl PrincipalRegistry {
    pub fn new(universe: Arc<TableUniverse>) -> Self {
        Self {
            universe,
            principals: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Principal> {
        self.principals.get(id)
    }

    /// All principals, ordered by id.
    pub fn list(&self) -> Vec<&Principal> {
        self.principals.values().collect()
    }

    /// Register a new principal.
    pub fn register(&mut self, id: &str) -> Result<Principal, PolicyError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(PolicyError::invalid_principal_id());
        }
        if self.principals.contains_key(id) {
            return Err(PolicyError::duplicate_principal(id));
        }

        let role = if self.principals.is_empty() {
            Role::Admin
        } else {
            Role::User
        };
        let allowed_tables = self.universe.table_names().map(str::to_string).collect();
        let principal = Principal::new(id, role, allowed_tables);

        tracing::info!(principal = %id, role = %role, "principal registered");
        self.principals.insert(id.to_string(), principal.clone());
        Ok(principal)
    }

    /// Change the role of `target`. Only admins may do this, and an admin
    /// cannot demote themselves.
    pub fn set_role(&mut self, actor: &str, target: &str, role: Role) -> Result<Principal, PolicyError> {
        self.require_admin(actor)?;
        if actor == target && role != Role::Admin {
            return Err(PolicyError::self_demotion(actor));
        }

        let principal = self
            .principals
            .get_mut(target)
            .ok_or_else(|| PolicyError::principal_not_found(target))?;
        principal.role = role;

        tracing::info!(actor = %actor, principal = %target, role = %role, "role updated");
        Ok(principal.clone())
    }

    /// Replace the stored table set of `target`.
    pub fn set_allowed_tables<I, S>(
        &mut self,
        actor: &str,
        target: &str,
        tables: I,
    ) -> Result<Principal, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.require_admin(actor)?;

        let tables: BTreeSet<String> = tables
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .collect();
        if tables.is_empty() {
            return Err(PolicyError::empty_table_set());
        }

        let unknown: BTreeSet<String> = tables
            .iter()
            .filter(|t| !self.universe.contains(t))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(PolicyError::unknown_tables(
                &unknown,
                self.universe.table_names().map(str::to_string),
            ));
        }

        let principal = self
            .principals
            .get_mut(target)
            .ok_or_else(|| PolicyError::principal_not_found(target))?;
        principal.allowed_tables = tables;

        tracing::info!(
            actor = %actor,
            principal = %target,
            tables = ?principal.allowed_tables,
            "allowed tables updated"
        );
        Ok(principal.clone())
    }

    fn require_admin(&self, actor: &str) -> Result<(), PolicyError> {
        let actor_principal = self
            .principals
            .get(actor)
            .ok_or_else(|| PolicyError::principal_not_found(actor))?;
        if !actor_principal.is_admin() {
            return Err(PolicyError::admin_required(actor));
        }
        Ok(())
    }
}
