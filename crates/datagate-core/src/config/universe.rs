//! Table universe definition.
//!
//! The universe is the fixed, closed set of queryable tables, with their column
//! manifests, enumerated status values and declared foreign-key relations. It is
//! static configuration, never derived from the live database schema.
//!
//! ```yaml
//! tables:
//!   clients:
//!     columns: [id, nom, ville, statut]
//!     status_values: [actif, inactif]
//!   commandes:
//!     columns: [id, client_id, montant_total]
//! relations:
//!   - from: commandes.client_id
//!     to: clients.id
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use super::ConfigError;

/// Closed set of known tables and their relations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableUniverse {
    /// Tables keyed by lower-case name. BTreeMap keeps iteration canonical.
    #[serde(default)]
    tables: BTreeMap<String, TableDefinition>,

    /// Declared foreign-key relations.
    #[serde(default)]
    relations: Vec<Relation>,
}

/// Column manifest of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Column names, in declaration order.
    #[serde(default)]
    pub columns: Vec<String>,

    /// Valid values of the table's `statut` column, when enumerated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_values: Vec<String>,
}

/// A `table.column` reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into().to_lowercase(),
            column: column.into(),
        }
    }
}

impl TryFrom<String> for ColumnRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.split_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                Ok(ColumnRef::new(table.trim(), column.trim()))
            }
            _ => Err(format!(
                "invalid column reference '{}' (expected table.column)",
                value
            )),
        }
    }
}

impl From<ColumnRef> for String {
    fn from(value: ColumnRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Foreign-key relation `from -> to`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub from: ColumnRef,
    pub to: ColumnRef,
}

impl Relation {
    /// Whether both endpoints satisfy `pred`.
    pub fn connects(&self, mut pred: impl FnMut(&str) -> bool) -> bool {
        pred(&self.from.table) && pred(&self.to.table)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

impl TableUniverse {
    /// Build a universe from parts. Table names are lower-cased.
    pub fn new(
        tables: impl IntoIterator<Item = (String, TableDefinition)>,
        relations: Vec<Relation>,
    ) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|(name, def)| (name.to_lowercase(), def))
                .collect(),
            relations,
        }
    }

    /// Load a universe from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a universe from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let universe: Self = serde_yaml::from_str(content)?;
        universe.validate()?;
        Ok(universe)
    }

    /// Table names must be lower-case and every relation endpoint must exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in self.tables.keys() {
            if name.is_empty() || *name != name.to_lowercase() {
                return Err(ConfigError::Config(format!(
                    "table name '{}' must be a non-empty lower-case identifier",
                    name
                )));
            }
        }

        for relation in &self.relations {
            for endpoint in [&relation.from, &relation.to] {
                let Some(table) = self.tables.get(&endpoint.table) else {
                    return Err(ConfigError::Config(format!(
                        "relation {} references unknown table '{}'",
                        relation, endpoint.table
                    )));
                };
                if !table.columns.is_empty() && !table.columns.contains(&endpoint.column) {
                    return Err(ConfigError::Config(format!(
                        "relation {} references unknown column '{}'",
                        relation, endpoint
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(&table.to_lowercase())
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(&name.to_lowercase())
    }

    /// Table names in canonical order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Tables in canonical order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableDefinition)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Relations in canonical order.
    pub fn relations(&self) -> Vec<&Relation> {
        let mut relations: Vec<&Relation> = self.relations.iter().collect();
        relations.sort();
        relations.dedup();
        relations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIVERSE: &str = r#"
tables:
  produits:
    columns: [id, nom]
  clients:
    columns: [id, nom, statut]
    status_values: [actif, inactif]
  commandes:
    columns: [id, client_id, produit_id]
relations:
  - from: commandes.produit_id
    to: produits.id
  - from: commandes.client_id
    to: clients.id
"#;

    #[test]
    fn tables_iterate_in_canonical_order() {
        let universe = TableUniverse::from_yaml(UNIVERSE).unwrap();
        let names: Vec<_> = universe.table_names().collect();
        assert_eq!(names, vec!["clients", "commandes", "produits"]);
    }

    #[test]
    fn relations_are_sorted() {
        let universe = TableUniverse::from_yaml(UNIVERSE).unwrap();
        let relations: Vec<String> = universe.relations().iter().map(|r| r.to_string()).collect();
        assert_eq!(
            relations,
            vec![
                "commandes.client_id -> clients.id",
                "commandes.produit_id -> produits.id"
            ]
        );
    }

    #[test]
    fn contains_is_case_insensitive() {
        let universe = TableUniverse::from_yaml(UNIVERSE).unwrap();
        assert!(universe.contains("CLIENTS"));
        assert!(!universe.contains("ventes"));
    }

    #[test]
    fn column_ref_requires_dot() {
        let err = TableUniverse::from_yaml(
            "tables:\n  a:\n    columns: [id]\nrelations:\n  - from: a\n    to: a.id\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("table.column"));
    }

    #[test]
    fn unknown_relation_column_is_rejected() {
        let err = TableUniverse::from_yaml(
            "tables:\n  a:\n    columns: [id]\n  b:\n    columns: [id]\nrelations:\n  - from: a.b_id\n    to: b.id\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("a.b_id"));
    }

    #[test]
    fn upper_case_table_name_is_rejected() {
        let err = TableUniverse::from_yaml("tables:\n  Clients:\n    columns: [id]\n").unwrap_err();
        assert!(err.to_string().contains("lower-case"));
    }
}
