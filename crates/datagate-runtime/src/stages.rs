//! Pipeline stages.
//!
//! Each stage reads the previous stage's text from the request and either
//! hands its own text to the next stage or stops the run with a rejection.
//! Generation-facing stages also read the principal through the gate's policy.

use async_trait::async_trait;
use datagate_core::ClassificationCategory;
use datagate_guard::{
    normalize_generated_sql, GateState, GateStep, GateVerdict, GuardError, Rejection,
    SecurityGate, POST_CHECK_ORDER,
};
use std::sync::Arc;
use std::time::Duration;

use crate::adapter::{QueryExecutor, TextGenerator};
use crate::error::PipelineError;
use crate::prompts;
use crate::request::PipelineRequest;

/// Shared, read-only collaborators of every run.
pub struct PipelineContext {
    pub generator: Arc<dyn TextGenerator>,
    pub executor: Arc<dyn QueryExecutor>,
    pub gate: SecurityGate,
    pub generation_timeout: Duration,
    pub execution_timeout: Duration,
    pub max_rows: usize,
}

impl PipelineContext {
    /// One bounded call to the generation service.
    async fn generate(
        &self,
        stage: &'static str,
        instruction: &str,
        input: &str,
    ) -> Result<String, PipelineError> {
        match tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(instruction, input),
        )
        .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(PipelineError::Generation(e)),
            Err(_) => Err(PipelineError::Timeout {
                stage,
                after: self.generation_timeout,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    /// Text for the next stage.
    Continue(String),
    /// The gate accepted this SQL. It is also the next stage's input.
    Accepted(String),
    /// Terminal refusal. No further stage runs.
    Stop(Rejection),
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        ctx: &PipelineContext,
        request: &mut PipelineRequest,
    ) -> Result<StageResult, PipelineError>;
}

/// The standard stage sequence.
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(PreCheckStage),
        Box::new(IntentStage),
        Box::new(ContextStage),
        Box::new(GenerationStage),
        Box::new(GateStage),
        Box::new(ExecutionStage),
        Box::new(FormatStage),
    ]
}

// =============================================================================
// PRE-CHECK
// =============================================================================

/// Classifies the raw question before any model sees it.
pub struct PreCheckStage;

#[async_trait]
impl Stage for PreCheckStage {
    fn name(&self) -> &'static str {
        "pre_check"
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        request: &mut PipelineRequest,
    ) -> Result<StageResult, PipelineError> {
        match ctx
            .gate
            .pre_check(&mut request.gate_state, &request.previous_output)?
        {
            GateStep::Pass => Ok(StageResult::Continue(request.previous_output.clone())),
            GateStep::Rejected(rejection) => Ok(StageResult::Stop(rejection)),
        }
    }
}

// =============================================================================
// INTENT
// =============================================================================

/// Extracts intent, entities and constraints from the question.
pub struct IntentStage;

#[async_trait]
impl Stage for IntentStage {
    fn name(&self) -> &'static str {
        "intent"
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        request: &mut PipelineRequest,
    ) -> Result<StageResult, PipelineError> {
        let analysis = ctx
            .generate(self.name(), prompts::INTENT_INSTRUCTION, &request.previous_output)
            .await?;
        Ok(StageResult::Continue(format!(
            "Question : {}\n\nAnalyse :\n{}",
            request.previous_output,
            analysis.trim()
        )))
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Appends the schema context the principal is allowed to see.
pub struct ContextStage;

#[async_trait]
impl Stage for ContextStage {
    fn name(&self) -> &'static str {
        "context"
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        request: &mut PipelineRequest,
    ) -> Result<StageResult, PipelineError> {
        let scoped = ctx.gate.policy().scoped_schema(&request.principal);
        Ok(StageResult::Continue(format!(
            "{}\n\nContexte schéma :\n{}",
            request.previous_output,
            scoped.render_instruction()
        )))
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Produces one SQL statement. Its output is advisory until the gate accepts it.
pub struct GenerationStage;

#[async_trait]
impl Stage for GenerationStage {
    fn name(&self) -> &'static str {
        "generation"
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        request: &mut PipelineRequest,
    ) -> Result<StageResult, PipelineError> {
        let scoped = ctx.gate.policy().scoped_schema(&request.principal);
        let instruction = prompts::generation_instruction(&scoped);

        let raw = ctx
            .generate(self.name(), &instruction, &request.previous_output)
            .await?;
        let sql = normalize_generated_sql(&raw);

        ctx.gate.mark_generated(&mut request.gate_state)?;
        tracing::debug!(session = %request.session_id, sql = %sql, "SQL generated");
        Ok(StageResult::Continue(sql))
    }
}

// =============================================================================
// GATE
// =============================================================================

/// Post-checks the generated SQL, optionally asks for a model review, then
/// cross-checks referenced tables against the principal's permissions.
pub struct GateStage;

#[async_trait]
impl Stage for GateStage {
    fn name(&self) -> &'static str {
        "gate"
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        request: &mut PipelineRequest,
    ) -> Result<StageResult, PipelineError> {
        let sql = request.previous_output.clone();

        let review = match ctx.gate.review_marker() {
            Some(marker) if needs_review(&ctx.gate, &sql) => {
                let scoped = ctx.gate.policy().scoped_schema(&request.principal);
                let instruction = prompts::review_instruction(&scoped, marker);
                let text = ctx.generate("review", &instruction, &sql).await?;
                Some(ctx.gate.review_verdict(&text))
            }
            _ => None,
        };

        if let GateStep::Rejected(rejection) =
            ctx.gate
                .post_check(&mut request.gate_state, &sql, review.as_ref())?
        {
            return Ok(StageResult::Stop(rejection));
        }

        match ctx
            .gate
            .authorize(&mut request.gate_state, &sql, &request.principal)?
        {
            GateVerdict::Accepted { sql } => {
                request.sql = Some(sql.clone());
                Ok(StageResult::Accepted(sql))
            }
            GateVerdict::Rejected(rejection) => Ok(StageResult::Stop(rejection)),
        }
    }
}

/// A review call is only worth making when the pattern checks would pass.
fn needs_review(gate: &SecurityGate, sql: &str) -> bool {
    !sql.trim().is_empty()
        && gate
            .classifier()
            .classify_any(sql, &POST_CHECK_ORDER)
            .is_none()
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Runs the accepted SQL through the read-only executor.
pub struct ExecutionStage;

#[async_trait]
impl Stage for ExecutionStage {
    fn name(&self) -> &'static str {
        "execution"
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        request: &mut PipelineRequest,
    ) -> Result<StageResult, PipelineError> {
        let sql = match (&request.sql, request.gate_state) {
            (Some(sql), GateState::Accepted) => sql.clone(),
            (_, state) => {
                return Err(PipelineError::Gate(GuardError::IllegalTransition {
                    from: state,
                    to: GateState::Accepted,
                }));
            }
        };

        let mut result = match tokio::time::timeout(
            ctx.execution_timeout,
            ctx.executor.execute_read_only(&sql),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => return Err(PipelineError::Execution(e)),
            Err(_) => {
                return Err(PipelineError::Timeout {
                    stage: self.name(),
                    after: ctx.execution_timeout,
                });
            }
        };
        result.truncate(ctx.max_rows);

        tracing::debug!(
            session = %request.session_id,
            rows = result.row_count(),
            truncated = result.truncated,
            "query executed"
        );

        if result.is_empty() {
            return Ok(StageResult::Continue(prompts::EMPTY_RESULT.to_string()));
        }
        Ok(StageResult::Continue(result.to_json().to_string()))
    }
}

// =============================================================================
// FORMAT
// =============================================================================

/// Rewrites query results as a business answer.
pub struct FormatStage;

#[async_trait]
impl Stage for FormatStage {
    fn name(&self) -> &'static str {
        "format"
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        request: &mut PipelineRequest,
    ) -> Result<StageResult, PipelineError> {
        let answer = ctx
            .generate(self.name(), prompts::FORMAT_INSTRUCTION, &request.previous_output)
            .await?;
        Ok(StageResult::Continue(answer.trim().to_string()))
    }
}

/// Category a stop came from, for logging.
pub(crate) fn stop_category(rejection: &Rejection) -> &'static str {
    rejection
        .category()
        .map(|c| c.as_str())
        .unwrap_or("access")
}
