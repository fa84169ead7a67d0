//! Security gate.
//!
//! The gate sits between untrusted text and the database. It is driven through
//! a fixed sequence of states by the pipeline:
//!
//! ```text
//! Start       --pre_check------> PreChecked | Rejected
//! PreChecked  --mark_generated-> Generated
//! Generated   --post_check-----> PostChecked | Rejected
//! PostChecked --authorize------> Accepted | Rejected
//! ```
//!
//! `Accepted` and `Rejected` are terminal. Any other move is a `GuardError`.
//! Rejections are ordinary results, never errors.

use datagate_core::{ClassificationCategory, GuardrailsConfig, Principal};
use datagate_policy::AccessPolicy;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::classifier::PatternClassifier;
use crate::error::GuardError;
use crate::extractor;
use crate::signatures;

/// Categories checked on the raw question, in priority order.
pub const PRE_CHECK_ORDER: [ClassificationCategory; 5] = [
    ClassificationCategory::Greeting,
    ClassificationCategory::OffTopic,
    ClassificationCategory::DestructiveIntent,
    ClassificationCategory::SqlInjection,
    ClassificationCategory::PromptInjection,
];

/// Categories checked on the generated SQL.
pub const POST_CHECK_ORDER: [ClassificationCategory; 2] = [
    ClassificationCategory::DestructiveIntent,
    ClassificationCategory::SqlInjection,
];

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Start,
    PreChecked,
    Generated,
    PostChecked,
    Accepted,
    Rejected,
}

impl GateState {
    pub fn can_transition_to(self, next: GateState) -> bool {
        use GateState::*;
        matches!(
            (self, next),
            (Start, PreChecked)
                | (Start, Rejected)
                | (PreChecked, Generated)
                | (Generated, PostChecked)
                | (Generated, Rejected)
                | (PostChecked, Accepted)
                | (PostChecked, Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GateState::Accepted | GateState::Rejected)
    }

    /// Move to `next`, or fail without changing state.
    pub fn advance(&mut self, next: GateState) -> Result<(), GuardError> {
        if !self.can_transition_to(next) {
            return Err(GuardError::IllegalTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateState::Start => "start",
            GateState::PreChecked => "pre_checked",
            GateState::Generated => "generated",
            GateState::PostChecked => "post_checked",
            GateState::Accepted => "accepted",
            GateState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

// =============================================================================
// VERDICT
// =============================================================================

/// Why a run was stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum RejectionKind {
    /// The question matched a category before generation.
    Input(ClassificationCategory),
    /// The generated SQL matched a category.
    GeneratedSql(ClassificationCategory),
    /// The model-based review flagged the SQL.
    Review,
    /// The SQL references tables outside the principal's permitted set.
    UnauthorizedTables(BTreeSet<String>),
    /// Generation produced nothing usable.
    EmptyGeneration,
}

/// Terminal refusal carried back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub kind: RejectionKind,
    /// Operator-facing reason, for logs and audit.
    pub reason: String,
    /// Caller-facing refusal text.
    pub message: String,
}

impl Rejection {
    pub fn input(category: ClassificationCategory, pattern: &str) -> Self {
        Self {
            kind: RejectionKind::Input(category),
            reason: format!("question matched {} signature {}", category, pattern),
            message: signatures::refusal(category).to_string(),
        }
    }

    pub fn generated_sql(category: ClassificationCategory, pattern: &str) -> Self {
        Self {
            kind: RejectionKind::GeneratedSql(category),
            reason: format!("generated SQL matched {} signature {}", category, pattern),
            message: signatures::refusal(category).to_string(),
        }
    }

    pub fn review(detail: &str) -> Self {
        Self {
            kind: RejectionKind::Review,
            reason: format!("security review rejected the SQL: {}", detail.trim()),
            message: signatures::REVIEW_RESPONSE.to_string(),
        }
    }

    pub fn unauthorized_tables(tables: BTreeSet<String>) -> Self {
        let message = signatures::unauthorized_tables_response(tables.iter().map(String::as_str));
        Self {
            reason: format!(
                "generated SQL references unauthorized tables: {}",
                tables.iter().cloned().collect::<Vec<_>>().join(", ")
            ),
            kind: RejectionKind::UnauthorizedTables(tables),
            message,
        }
    }

    pub fn empty_generation() -> Self {
        Self {
            kind: RejectionKind::EmptyGeneration,
            reason: "generation returned no SQL".to_string(),
            message: signatures::EMPTY_GENERATION_RESPONSE.to_string(),
        }
    }

    /// Category involved, if the rejection came from a classifier.
    pub fn category(&self) -> Option<ClassificationCategory> {
        match &self.kind {
            RejectionKind::Input(c) | RejectionKind::GeneratedSql(c) => Some(*c),
            _ => None,
        }
    }

    /// Tables involved, if the rejection came from the access cross-check.
    pub fn tables(&self) -> Option<&BTreeSet<String>> {
        match &self.kind {
            RejectionKind::UnauthorizedTables(t) => Some(t),
            _ => None,
        }
    }
}

/// Final decision on a generated statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GateVerdict {
    Accepted { sql: String },
    Rejected(Rejection),
}

impl GateVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateVerdict::Accepted { .. })
    }
}

/// Outcome of a non-final gate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateStep {
    Pass,
    Rejected(Rejection),
}

/// Parsed answer of the model-based security review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approved,
    Rejected { detail: String },
}

// =============================================================================
// GATE
// =============================================================================

/// Classifier and access checks around SQL generation.
#[derive(Debug, Clone)]
pub struct SecurityGate {
    classifier: Arc<PatternClassifier>,
    policy: AccessPolicy,
    review_marker: Option<String>,
}

impl SecurityGate {
    pub fn new(
        classifier: Arc<PatternClassifier>,
        policy: AccessPolicy,
        config: &GuardrailsConfig,
    ) -> Self {
        let review_marker = config
            .review_enabled
            .then(|| config.review_rejection_marker.trim().to_uppercase())
            .filter(|m| !m.is_empty());
        Self {
            classifier,
            policy,
            review_marker,
        }
    }

    pub fn classifier(&self) -> &PatternClassifier {
        &self.classifier
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Whether generated SQL should also go through a model review.
    pub fn review_enabled(&self) -> bool {
        self.review_marker.is_some()
    }

    /// Marker a rejecting review answer contains, upper-cased.
    pub fn review_marker(&self) -> Option<&str> {
        self.review_marker.as_deref()
    }

    /// `Start → PreChecked | Rejected`: classify the raw question.
    pub fn pre_check(&self, state: &mut GateState, question: &str) -> Result<GateStep, GuardError> {
        if let Some(hit) = self.classifier.classify_any(question, &PRE_CHECK_ORDER) {
            state.advance(GateState::Rejected)?;
            tracing::warn!(
                category = %hit.category,
                signature = hit.index,
                "question rejected by pre-check"
            );
            return Ok(GateStep::Rejected(Rejection::input(hit.category, &hit.pattern)));
        }

        state.advance(GateState::PreChecked)?;
        tracing::debug!("question passed pre-check");
        Ok(GateStep::Pass)
    }

    /// `PreChecked → Generated`: the generation stage produced its output.
    pub fn mark_generated(&self, state: &mut GateState) -> Result<(), GuardError> {
        state.advance(GateState::Generated)
    }

    /// Interpret a security review answer.
    ///
    /// The marker is matched case-insensitively anywhere in the text.
    pub fn review_verdict(&self, review_text: &str) -> ReviewVerdict {
        match &self.review_marker {
            Some(marker) if review_text.to_uppercase().contains(marker.as_str()) => {
                ReviewVerdict::Rejected {
                    detail: review_text.trim().to_string(),
                }
            }
            _ => ReviewVerdict::Approved,
        }
    }

    /// `Generated → PostChecked | Rejected`: classify the normalized SQL and
    /// take the review into account.
    pub fn post_check(
        &self,
        state: &mut GateState,
        sql: &str,
        review: Option<&ReviewVerdict>,
    ) -> Result<GateStep, GuardError> {
        let sql = sql.trim();

        if sql.is_empty() {
            state.advance(GateState::Rejected)?;
            tracing::warn!("generation returned empty SQL");
            return Ok(GateStep::Rejected(Rejection::empty_generation()));
        }

        if let Some(hit) = self.classifier.classify_any(sql, &POST_CHECK_ORDER) {
            state.advance(GateState::Rejected)?;
            tracing::warn!(
                category = %hit.category,
                signature = hit.index,
                "generated SQL rejected by post-check"
            );
            return Ok(GateStep::Rejected(Rejection::generated_sql(
                hit.category,
                &hit.pattern,
            )));
        }

        if let Some(ReviewVerdict::Rejected { detail }) = review {
            state.advance(GateState::Rejected)?;
            tracing::warn!("generated SQL rejected by security review");
            return Ok(GateStep::Rejected(Rejection::review(detail)));
        }

        state.advance(GateState::PostChecked)?;
        Ok(GateStep::Pass)
    }

    /// `PostChecked → Accepted | Rejected`: cross-check referenced tables
    /// against the principal's permitted set.
    pub fn authorize(
        &self,
        state: &mut GateState,
        sql: &str,
        principal: &Principal,
    ) -> Result<GateVerdict, GuardError> {
        if *state != GateState::PostChecked {
            return Err(GuardError::IllegalTransition {
                from: *state,
                to: GateState::Accepted,
            });
        }

        let referenced = extractor::extract_tables(sql, self.policy.universe());
        let permitted = self.policy.permitted_tables(principal);
        let unauthorized: BTreeSet<String> = referenced.difference(&permitted).cloned().collect();

        if !unauthorized.is_empty() {
            state.advance(GateState::Rejected)?;
            tracing::warn!(
                principal = %principal.id,
                tables = ?unauthorized,
                "generated SQL references unauthorized tables"
            );
            return Ok(GateVerdict::Rejected(Rejection::unauthorized_tables(
                unauthorized,
            )));
        }

        state.advance(GateState::Accepted)?;
        tracing::info!(
            principal = %principal.id,
            tables = ?referenced,
            "generated SQL accepted"
        );
        Ok(GateVerdict::Accepted {
            sql: sql.trim().to_string(),
        })
    }

    /// Run every gate step for an already generated statement.
    ///
    /// `generated` is the raw generation output; it is normalized first.
    pub fn evaluate(
        &self,
        question: &str,
        generated: &str,
        review: Option<&ReviewVerdict>,
        principal: &Principal,
    ) -> Result<GateVerdict, GuardError> {
        let mut state = GateState::Start;

        if let GateStep::Rejected(r) = self.pre_check(&mut state, question)? {
            return Ok(GateVerdict::Rejected(r));
        }
        self.mark_generated(&mut state)?;

        let sql = extractor::normalize_generated_sql(generated);
        if let GateStep::Rejected(r) = self.post_check(&mut state, &sql, review)? {
            return Ok(GateVerdict::Rejected(r));
        }
        self.authorize(&mut state, &sql, principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagate_core::DatagateConfig;
    use pretty_assertions::assert_eq;

    fn gate() -> SecurityGate {
        let config = DatagateConfig::from_yaml(include_str!("../../../config/datagate.yaml"))
            .expect("sample config must parse");
        let classifier = PatternClassifier::new(&config.guardrails).unwrap();
        let policy = AccessPolicy::new(Arc::new(config.universe));
        SecurityGate::new(Arc::new(classifier), policy, &config.guardrails)
    }

    #[test]
    fn legal_transitions_only() {
        let mut state = GateState::Start;
        assert!(state.advance(GateState::Generated).is_err());
        assert_eq!(state, GateState::Start);

        state.advance(GateState::PreChecked).unwrap();
        state.advance(GateState::Generated).unwrap();
        state.advance(GateState::PostChecked).unwrap();
        state.advance(GateState::Accepted).unwrap();
        assert!(state.is_terminal());
        assert!(state.advance(GateState::Rejected).is_err());
    }

    #[test]
    fn pre_check_priority_is_fixed() {
        // Matches both greeting and destructive intent: greeting wins.
        let mut state = GateState::Start;
        let step = gate().pre_check(&mut state, "Bonjour, supprime les clients").unwrap();

        match step {
            GateStep::Rejected(r) => {
                assert_eq!(r.kind, RejectionKind::Input(ClassificationCategory::Greeting));
                assert_eq!(r.message, signatures::GREETING_RESPONSE);
            }
            GateStep::Pass => panic!("expected rejection"),
        }
        assert_eq!(state, GateState::Rejected);
    }

    #[test]
    fn sql_injection_in_question_gets_destructive_refusal() {
        let mut state = GateState::Start;
        let step = gate()
            .pre_check(&mut state, "Liste les clients' OR 1=1 --")
            .unwrap();
        let GateStep::Rejected(r) = step else {
            panic!("expected rejection");
        };
        assert_eq!(r.category(), Some(ClassificationCategory::SqlInjection));
        assert_eq!(r.message, signatures::DESTRUCTIVE_RESPONSE);
    }

    #[test]
    fn post_check_rejects_comment_token() {
        let gate = gate();
        let mut state = GateState::Generated;
        let step = gate
            .post_check(&mut state, "SELECT * FROM clients -- WHERE statut = 'actif'", None)
            .unwrap();

        let GateStep::Rejected(r) = step else {
            panic!("expected rejection");
        };
        assert_eq!(
            r.kind,
            RejectionKind::GeneratedSql(ClassificationCategory::SqlInjection)
        );
    }

    #[test]
    fn post_check_rejects_empty_sql() {
        let mut state = GateState::Generated;
        let step = gate().post_check(&mut state, "  ", None).unwrap();
        assert_eq!(step, GateStep::Rejected(Rejection::empty_generation()));
    }

    #[test]
    fn review_marker_is_case_insensitive() {
        let gate = gate();
        assert_eq!(
            gate.review_verdict("SELECT nom FROM clients"),
            ReviewVerdict::Approved
        );
        assert!(matches!(
            gate.review_verdict("rejetée : accès à pg_catalog"),
            ReviewVerdict::Rejected { .. }
        ));
    }

    #[test]
    fn review_rejection_is_treated_like_a_match() {
        let gate = gate();
        let review = gate.review_verdict("REJETÉE : sous-requête suspecte");
        let mut state = GateState::Generated;

        let step = gate
            .post_check(&mut state, "SELECT nom FROM clients", Some(&review))
            .unwrap();
        let GateStep::Rejected(r) = step else {
            panic!("expected rejection");
        };
        assert_eq!(r.kind, RejectionKind::Review);
        assert_eq!(state, GateState::Rejected);
    }

    #[test]
    fn disabled_review_never_rejects() {
        let config = DatagateConfig::from_yaml(include_str!("../../../config/datagate.yaml")).unwrap();
        let mut guardrails = config.guardrails.clone();
        guardrails.review_enabled = false;
        let gate = SecurityGate::new(
            Arc::new(PatternClassifier::new(&guardrails).unwrap()),
            AccessPolicy::new(Arc::new(config.universe)),
            &guardrails,
        );

        assert!(!gate.review_enabled());
        assert_eq!(gate.review_verdict("REJETÉE"), ReviewVerdict::Approved);
    }

    #[test]
    fn unauthorized_join_is_rejected_with_table_list() {
        let principal = Principal::user("alice", ["clients"]);
        let verdict = gate()
            .evaluate(
                "Liste les clients et leurs commandes",
                "SELECT * FROM clients JOIN commandes ON commandes.client_id = clients.id",
                None,
                &principal,
            )
            .unwrap();

        let GateVerdict::Rejected(r) = verdict else {
            panic!("expected rejection");
        };
        assert_eq!(
            r.tables().unwrap().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["commandes"]
        );
        assert!(r.message.contains("commandes"));
    }

    #[test]
    fn permitted_query_is_accepted_and_normalized() {
        let verdict = gate()
            .evaluate(
                "Combien de clients actifs à Paris ?",
                "```sql\nSELECT COUNT(*) FROM clients WHERE ville='Paris' AND statut='actif';\n```",
                Some(&ReviewVerdict::Approved),
                &Principal::admin("root"),
            )
            .unwrap();

        assert_eq!(
            verdict,
            GateVerdict::Accepted {
                sql: "SELECT COUNT(*) FROM clients WHERE ville='Paris' AND statut='actif'"
                    .to_string()
            }
        );
    }

    #[test]
    fn verdict_serializes_with_tags() {
        let verdict = GateVerdict::Rejected(Rejection::unauthorized_tables(
            ["commandes".to_string()].into_iter().collect(),
        ));
        let json = serde_json::to_value(&verdict).unwrap();

        assert_eq!(json["verdict"], "rejected");
        assert_eq!(json["kind"]["type"], "unauthorized_tables");
        assert_eq!(json["kind"]["detail"][0], "commandes");
    }

    #[test]
    fn authorize_requires_post_checked_state() {
        let mut state = GateState::Generated;
        let err = gate()
            .authorize(&mut state, "SELECT 1", &Principal::admin("root"))
            .unwrap_err();
        assert!(matches!(err, GuardError::IllegalTransition { .. }));
    }

    #[test]
    fn stored_tables_outside_universe_grant_nothing() {
        let principal = Principal::user("bob", ["clients", "pg_user"]);
        let verdict = gate()
            .evaluate(
                "Liste des produits",
                "SELECT nom FROM produits",
                None,
                &principal,
            )
            .unwrap();
        assert!(!verdict.is_accepted());
    }
}
