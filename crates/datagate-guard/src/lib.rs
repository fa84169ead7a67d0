//! Datagate Guardrails
//!
//! Everything that stands between untrusted text and the database:
//!
//! - [`PatternClassifier`]: signature-based classification of questions and SQL
//! - [`extractor`]: lexical scan of generated SQL for referenced tables
//! - [`SecurityGate`]: the pre-check / post-check / access cross-check sequence
//! - [`Redactor`]: masking of contact details in outbound answers
//!
//! The gate never executes anything. A rejection is a value ([`GateVerdict`]),
//! and only an `Accepted` verdict carries SQL.

pub mod classifier;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod redact;
pub mod signatures;

pub use classifier::{PatternClassifier, SignatureMatch};
pub use error::GuardError;
pub use extractor::{extract_tables, normalize_generated_sql};
pub use gate::{
    GateState, GateStep, GateVerdict, Rejection, RejectionKind, ReviewVerdict, SecurityGate,
    POST_CHECK_ORDER, PRE_CHECK_ORDER,
};
pub use redact::Redactor;
