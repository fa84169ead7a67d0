//! Datagate Access Policy
//!
//! Role-based table access: which tables and relations a principal may see in
//! the generation instruction, which tables are explicitly forbidden, and the
//! permitted-table set used to validate generated SQL.
//!
//! Admins implicitly own the whole table universe. Users own the stored table
//! set the admin gave them, restricted to the universe.

pub mod error;
pub mod registry;
pub mod scope;

pub use error::{PolicyError, PolicyErrorKind};
pub use registry::PrincipalRegistry;
pub use scope::{AccessPolicy, RelationDescriptor, ScopedSchema, TableDescriptor};
