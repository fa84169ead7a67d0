//! Gate decision audit trail.

use chrono::{DateTime, Utc};
use datagate_core::ClassificationCategory;
use datagate_guard::{Rejection, RejectionKind};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditDecision {
    Accepted,
    Rejected,
}

/// One gate decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub occurred_at: DateTime<Utc>,
    pub session_id: String,
    pub principal: String,
    /// Stage that produced the decision.
    pub stage: &'static str,
    pub decision: AuditDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ClassificationCategory>,
    /// Tables referenced by the SQL, or the unauthorized ones on rejection.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tables: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuditEvent {
    pub fn accepted(
        session_id: &str,
        principal: &str,
        stage: &'static str,
        tables: BTreeSet<String>,
    ) -> Self {
        Self {
            occurred_at: Utc::now(),
            session_id: session_id.to_string(),
            principal: principal.to_string(),
            stage,
            decision: AuditDecision::Accepted,
            category: None,
            tables,
            reason: None,
        }
    }

    pub fn rejected(
        session_id: &str,
        principal: &str,
        stage: &'static str,
        rejection: &Rejection,
    ) -> Self {
        let tables = match &rejection.kind {
            RejectionKind::UnauthorizedTables(t) => t.clone(),
            _ => BTreeSet::new(),
        };
        Self {
            occurred_at: Utc::now(),
            session_id: session_id.to_string(),
            principal: principal.to_string(),
            stage,
            decision: AuditDecision::Rejected,
            category: rejection.category(),
            tables,
            reason: Some(rejection.reason.clone()),
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emits each event as a structured `tracing` record on the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let category = event.category.map(|c| c.as_str()).unwrap_or("-");
        match event.decision {
            AuditDecision::Accepted => tracing::info!(
                target: "audit",
                session = %event.session_id,
                principal = %event.principal,
                stage = event.stage,
                tables = ?event.tables,
                "gate accepted"
            ),
            AuditDecision::Rejected => tracing::warn!(
                target: "audit",
                session = %event.session_id,
                principal = %event.principal,
                stage = event.stage,
                category,
                tables = ?event.tables,
                reason = event.reason.as_deref().unwrap_or(""),
                "gate rejected"
            ),
        }
    }
}

/// Keeps events in memory. Meant for tests and the CLI.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
