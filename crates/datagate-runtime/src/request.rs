use datagate_core::Principal;
use datagate_guard::GateState;

/// Per-run state, owned by the orchestrator and handed to each stage.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub question: String,
    pub principal: Principal,
    pub session_id: String,
    pub gate_state: GateState,
    /// Text output of the last stage that ran. Starts as the question.
    pub previous_output: String,
    /// SQL currently resolved for this run. Only set once the gate accepted it.
    pub sql: Option<String>,
}

impl PipelineRequest {
    pub fn new(question: impl Into<String>, principal: Principal, session_id: impl Into<String>) -> Self {
        let question = question.into();
        Self {
            previous_output: question.clone(),
            question,
            principal,
            session_id: session_id.into(),
            gate_state: GateState::Start,
            sql: None,
        }
    }
}
