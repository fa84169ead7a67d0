//! Policy error types.
//!
//! Errors raised by principal lifecycle operations, organized by the kind of
//! violation so callers (HTTP surface, CLI) can map them to stable codes.

use std::collections::BTreeSet;
use std::fmt;

/// Error type for policy violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyError {
    /// The kind of policy error.
    pub kind: PolicyErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl PolicyError {
    pub fn new(kind: PolicyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    // =========================================================================
    // PRINCIPAL ERRORS
    // =========================================================================

    pub fn principal_not_found(id: &str) -> Self {
        Self::new(
            PolicyErrorKind::PrincipalNotFound,
            format!("Principal '{}' does not exist", id),
        )
    }

    pub fn duplicate_principal(id: &str) -> Self {
        Self::new(
            PolicyErrorKind::DuplicatePrincipal,
            format!("Principal '{}' is already registered", id),
        )
    }

    pub fn invalid_principal_id() -> Self {
        Self::new(
            PolicyErrorKind::InvalidPrincipalId,
            "Principal id cannot be empty",
        )
    }

    // =========================================================================
    // ADMIN ACTION ERRORS
    // =========================================================================

    pub fn admin_required(actor: &str) -> Self {
        Self::new(
            PolicyErrorKind::AdminRequired,
            format!("Principal '{}' is not an administrator", actor),
        )
    }

    pub fn self_demotion(actor: &str) -> Self {
        Self::new(
            PolicyErrorKind::SelfDemotion,
            format!("Administrator '{}' cannot remove their own admin role", actor),
        )
    }

    // =========================================================================
    // TABLE SET ERRORS
    // =========================================================================

    pub fn empty_table_set() -> Self {
        Self::new(
            PolicyErrorKind::EmptyTableSet,
            "At least one table must be allowed",
        )
    }

    pub fn unknown_tables(unknown: &BTreeSet<String>, valid: impl Iterator<Item = String>) -> Self {
        Self::new(
            PolicyErrorKind::UnknownTables,
            format!(
                "Unknown tables: {}. Valid tables: {}",
                join(unknown.iter().cloned()),
                join(valid)
            ),
        )
    }

    /// Stable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self.kind {
            PolicyErrorKind::PrincipalNotFound => "PRINCIPAL_NOT_FOUND",
            PolicyErrorKind::DuplicatePrincipal => "DUPLICATE_PRINCIPAL",
            PolicyErrorKind::InvalidPrincipalId => "INVALID_PRINCIPAL_ID",
            PolicyErrorKind::AdminRequired => "ADMIN_REQUIRED",
            PolicyErrorKind::SelfDemotion => "SELF_DEMOTION",
            PolicyErrorKind::EmptyTableSet => "EMPTY_TABLE_SET",
            PolicyErrorKind::UnknownTables => "UNKNOWN_TABLES",
        }
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PolicyError {}

/// Categories of policy errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyErrorKind {
    PrincipalNotFound,
    DuplicatePrincipal,
    InvalidPrincipalId,
    /// Mutation attempted by a non-admin principal.
    AdminRequired,
    /// An admin tried to downgrade themselves.
    SelfDemotion,
    EmptyTableSet,
    /// Table set contains names outside the universe.
    UnknownTables,
}
