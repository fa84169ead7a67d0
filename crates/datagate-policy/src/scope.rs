//! Principal-scoped view of the table universe.
//!
//! The scoped schema is what the SQL generation step is allowed to know about:
//! only permitted tables, only relations whose both ends are permitted, and an
//! explicit list of forbidden tables for the negative instruction.

use datagate_core::{Principal, Relation, TableDefinition, TableUniverse};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;

/// One permitted table with its column manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    pub status_values: Vec<String>,
}

impl TableDescriptor {
    fn from_definition(name: &str, def: &TableDefinition) -> Self {
        Self {
            name: name.to_string(),
            columns: def.columns.clone(),
            status_values: def.status_values.clone(),
        }
    }
}

/// One permitted relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationDescriptor {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

impl From<&Relation> for RelationDescriptor {
    fn from(relation: &Relation) -> Self {
        Self {
            from_table: relation.from.table.clone(),
            from_column: relation.from.column.clone(),
            to_table: relation.to.table.clone(),
            to_column: relation.to.column.clone(),
        }
    }
}

/// Result of scoping the universe to a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopedSchema {
    pub tables: Vec<TableDescriptor>,
    pub relations: Vec<RelationDescriptor>,
    pub forbidden: BTreeSet<String>,
}

impl ScopedSchema {
    /// No table is reachable: generation must not be attempted.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Render the schema section of the generation instruction.
    ///
    /// Output is a pure function of the scoped schema, so two calls for the same
    /// principal produce byte-identical prompts.
    pub fn render_instruction(&self) -> String {
        let mut out = String::new();

        out.push_str("TABLES DISPONIBLES (il n'en existe AUCUNE autre) :\n");
        for table in &self.tables {
            let _ = writeln!(out, "- {} ({})", table.name, table.columns.join(", "));
            if !table.status_values.is_empty() {
                let values: Vec<String> = table
                    .status_values
                    .iter()
                    .map(|v| format!("'{}'", v))
                    .collect();
                let _ = writeln!(out, "  → statut : UNIQUEMENT {}", values.join(" ou "));
            }
        }

        if !self.relations.is_empty() {
            out.push_str("\nRELATIONS :\n");
            for rel in &self.relations {
                let _ = writeln!(
                    out,
                    "- {}.{} → {}.{}",
                    rel.from_table, rel.from_column, rel.to_table, rel.to_column
                );
            }
        }

        if !self.forbidden.is_empty() {
            out.push_str(
                "\nTABLES INTERDITES (accès refusé pour cet utilisateur, ne jamais les utiliser, \
                 même dans une jointure ou une sous-requête) :\n",
            );
            for name in &self.forbidden {
                let _ = writeln!(out, "- {}", name);
            }
        }

        out
    }
}

/// Maps principals to the tables and relations they may use.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    universe: Arc<TableUniverse>,
}

impl AccessPolicy {
    pub fn new(universe: Arc<TableUniverse>) -> Self {
        Self { universe }
    }

    pub fn universe(&self) -> &TableUniverse {
        &self.universe
    }

    /// Effective set of tables the principal may query.
    pub fn permitted_tables(&self, principal: &Principal) -> BTreeSet<String> {
        principal.effective_tables(&self.universe)
    }

    /// Scope the universe to a principal.
    pub fn scoped_schema(&self, principal: &Principal) -> ScopedSchema {
        let permitted = self.permitted_tables(principal);

        let tables = self
            .universe
            .tables()
            .filter(|(name, _)| permitted.contains(*name))
            .map(|(name, def)| TableDescriptor::from_definition(name, def))
            .collect();

        let relations = self
            .universe
            .relations()
            .into_iter()
            .filter(|r| r.connects(|t| permitted.contains(t)))
            .map(RelationDescriptor::from)
            .collect();

        let forbidden = self
            .universe
            .table_names()
            .filter(|name| !permitted.contains(*name))
            .map(str::to_string)
            .collect();

        tracing::debug!(
            principal = %principal.id,
            permitted = permitted.len(),
            "scoped schema built"
        );

        ScopedSchema {
            tables,
            relations,
            forbidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagate_core::DatagateConfig;
    use pretty_assertions::assert_eq;

    fn policy() -> AccessPolicy {
        let config = DatagateConfig::from_yaml(include_str!("../../../config/datagate.yaml"))
            .expect("sample config must parse");
        AccessPolicy::new(Arc::new(config.universe))
    }

    #[test]
    fn single_table_principal_gets_no_relations() {
        let scoped = policy().scoped_schema(&Principal::user("alice", ["clients"]));

        assert_eq!(scoped.table_names().collect::<Vec<_>>(), vec!["clients"]);
        assert!(scoped.relations.is_empty());
        assert_eq!(
            scoped.forbidden.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["commandes", "produits"]
        );
    }

    #[test]
    fn relation_kept_only_when_both_ends_allowed() {
        let scoped = policy().scoped_schema(&Principal::user("bob", ["clients", "commandes"]));

        assert_eq!(scoped.relations.len(), 1);
        assert_eq!(scoped.relations[0].from_table, "commandes");
        assert_eq!(scoped.relations[0].to_table, "clients");
    }

    #[test]
    fn tables_follow_canonical_order_not_insertion_order() {
        let scoped = policy().scoped_schema(&Principal::user("carol", ["produits", "clients"]));
        assert_eq!(
            scoped.table_names().collect::<Vec<_>>(),
            vec!["clients", "produits"]
        );
    }

    #[test]
    fn empty_allowed_set_forbids_everything() {
        let principal = Principal::user("nobody", Vec::<String>::new());
        let scoped = policy().scoped_schema(&principal);

        assert!(scoped.is_empty());
        assert!(scoped.relations.is_empty());
        assert_eq!(scoped.forbidden.len(), 3);
    }

    #[test]
    fn admin_has_no_forbidden_tables() {
        let scoped = policy().scoped_schema(&Principal::admin("root"));
        assert_eq!(scoped.tables.len(), 3);
        assert_eq!(scoped.relations.len(), 2);
        assert!(scoped.forbidden.is_empty());
    }

    #[test]
    fn instruction_lists_forbidden_tables_and_status_values() {
        let text = policy()
            .scoped_schema(&Principal::user("alice", ["clients"]))
            .render_instruction();

        assert!(text.contains("- clients (id, nom, prenom, email, ville, date_inscription, statut)"));
        assert!(text.contains("UNIQUEMENT 'actif' ou 'inactif'"));
        assert!(text.contains("TABLES INTERDITES"));
        assert!(text.contains("- commandes\n"));
        assert!(!text.contains("RELATIONS"));
    }

    #[test]
    fn scoped_schema_serializes() {
        let scoped = policy().scoped_schema(&Principal::user("alice", ["produits"]));
        let json = serde_json::to_value(&scoped).unwrap();
        assert_eq!(json["tables"][0]["name"], "produits");
        assert_eq!(json["forbidden"][0], "clients");
    }
}
