use crate::adapter::{QueryExecutor, TextGenerator};
use crate::audit::{AuditEvent, AuditSink, TracingAuditSink};
use crate::error::PipelineError;
use crate::request::PipelineRequest;
use crate::stages::{self, PipelineContext, Stage, StageResult};
use datagate_core::{GuardrailsConfig, PipelineConfig, Principal};
use datagate_guard::{extract_tables, Redactor, Rejection, SecurityGate};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// What a run hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub answer: String,
    pub session_id: String,
    /// The executed SQL, absent whenever the run was stopped.
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl PipelineOutcome {
    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}

pub struct Orchestrator {
    ctx: PipelineContext,
    stages: Vec<Box<dyn Stage>>,
    audit: Arc<dyn AuditSink>,
    redactor: Redactor,
    max_question_chars: usize,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        executor: Arc<dyn QueryExecutor>,
        gate: SecurityGate,
        pipeline: &PipelineConfig,
        guardrails: &GuardrailsConfig,
    ) -> Self {
        Self {
            ctx: PipelineContext {
                generator,
                executor,
                gate,
                generation_timeout: pipeline.generation_timeout(),
                execution_timeout: pipeline.execution_timeout(),
                max_rows: pipeline.max_rows,
            },
            stages: stages::default_stages(),
            audit: Arc::new(TracingAuditSink),
            redactor: Redactor::new(),
            max_question_chars: guardrails.max_question_chars,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Override the per-call budgets from configuration.
    pub fn with_timeouts(mut self, generation: Duration, execution: Duration) -> Self {
        self.ctx.generation_timeout = generation;
        self.ctx.execution_timeout = execution;
        self
    }

    pub fn gate(&self) -> &SecurityGate {
        &self.ctx.gate
    }

    /// Answer one question for one principal.
    ///
    /// Rejections end the run normally: `answer` is the refusal text, `sql` is
    /// `None` and `rejection` says why. Only failures are errors.
    pub async fn run(
        &self,
        question: &str,
        principal: &Principal,
        session_id: Option<&str>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::InvalidInput(
                "question cannot be empty".to_string(),
            ));
        }
        let length = question.chars().count();
        if length > self.max_question_chars {
            return Err(PipelineError::InvalidInput(format!(
                "question is too long ({} characters, max {})",
                length, self.max_question_chars
            )));
        }

        if self.ctx.gate.policy().permitted_tables(principal).is_empty() {
            return Err(PipelineError::NoTableAccess(principal.id.clone()));
        }

        let session_id = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut request = PipelineRequest::new(question, principal.clone(), session_id);

        for stage in &self.stages {
            tracing::debug!(session = %request.session_id, stage = stage.name(), "stage start");

            match stage.run(&self.ctx, &mut request).await? {
                StageResult::Continue(text) => {
                    request.previous_output = text;
                }
                StageResult::Accepted(sql) => {
                    self.audit.record(AuditEvent::accepted(
                        &request.session_id,
                        &request.principal.id,
                        stage.name(),
                        extract_tables(&sql, self.ctx.gate.policy().universe()),
                    ));
                    request.previous_output = sql;
                }
                StageResult::Stop(rejection) => {
                    tracing::info!(
                        session = %request.session_id,
                        stage = stage.name(),
                        category = stages::stop_category(&rejection),
                        "run stopped"
                    );
                    self.audit.record(AuditEvent::rejected(
                        &request.session_id,
                        &request.principal.id,
                        stage.name(),
                        &rejection,
                    ));
                    return Ok(PipelineOutcome {
                        answer: self.redactor.redact(&rejection.message).into_owned(),
                        session_id: request.session_id,
                        sql: None,
                        rejection: Some(rejection),
                    });
                }
            }
        }

        Ok(PipelineOutcome {
            answer: self.redactor.redact(&request.previous_output).into_owned(),
            session_id: request.session_id,
            sql: request.sql,
            rejection: None,
        })
    }
}
