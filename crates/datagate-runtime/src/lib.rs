//! Datagate pipeline runtime.
//!
//! Drives a question through pre-check, intent extraction, schema context,
//! SQL generation, the security gate, read-only execution and formatting.
//! External services are reached only through [`TextGenerator`] and
//! [`QueryExecutor`]; every call to them is bounded by a timeout.

pub mod adapter;
pub mod audit;
pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod request;
pub mod stages;

pub use adapter::{QueryExecutor, QueryResult, TextGenerator};
pub use audit::{AuditDecision, AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use error::PipelineError;
pub use orchestrator::{Orchestrator, PipelineOutcome};
pub use request::PipelineRequest;
pub use stages::{PipelineContext, Stage, StageResult};
