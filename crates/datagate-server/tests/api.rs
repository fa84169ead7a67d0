use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use datagate_core::DatagateConfig;
use datagate_guard::{PatternClassifier, SecurityGate};
use datagate_policy::{AccessPolicy, PrincipalRegistry};
use datagate_runtime::{Orchestrator, QueryExecutor, QueryResult, TextGenerator};
use datagate_server::{router, AppState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const CONFIG: &str = include_str!("../../../config/datagate.yaml");

/// Answers by instruction kind: SQL for generation, a verdict for review,
/// plain prose otherwise.
struct CannedGenerator;

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, instruction: &str, _input: &str) -> anyhow::Result<String> {
        if instruction.contains("SELECT") {
            return Ok("SELECT count(*) AS total FROM clients WHERE ville = 'Paris'".to_string());
        }
        Ok("Il y a 3 clients actifs à Paris.".to_string())
    }
}

struct OneRowExecutor;

#[async_trait]
impl QueryExecutor for OneRowExecutor {
    async fn execute_read_only(&self, _sql: &str) -> anyhow::Result<QueryResult> {
        Ok(QueryResult {
            columns: vec!["total".into()],
            rows: vec![vec![json!(3)]],
            truncated: false,
        })
    }
}

fn app() -> Router {
    let mut config = DatagateConfig::from_yaml(CONFIG).unwrap();
    config.guardrails.review_enabled = false;

    let universe = Arc::new(config.universe.clone());
    let classifier = Arc::new(PatternClassifier::new(&config.guardrails).unwrap());
    let gate = SecurityGate::new(classifier, AccessPolicy::new(universe.clone()), &config.guardrails);
    let orchestrator = Orchestrator::new(
        Arc::new(CannedGenerator),
        Arc::new(OneRowExecutor),
        gate,
        &config.pipeline,
        &config.guardrails,
    );

    router(Arc::new(AppState::new(orchestrator, PrincipalRegistry::new(universe))))
}

async fn send(app: &Router, method: &str, uri: &str, principal: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(id) = principal {
        builder = builder.header("x-principal-id", id);
    }
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, id: &str) {
    let (status, _) = send(app, "POST", "/api/register", None, Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = send(&app(), "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn first_registration_is_admin() {
    let app = app();
    let (_, first) = send(&app, "POST", "/api/register", None, Some(json!({ "id": "alice" }))).await;
    let (_, second) = send(&app, "POST", "/api/register", None, Some(json!({ "id": "bob" }))).await;

    assert_eq!(first["role"], "admin");
    assert_eq!(second["role"], "user");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    register(&app, "alice").await;
    let (status, body) = send(&app, "POST", "/api/register", None, Some(json!({ "id": "alice" }))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_PRINCIPAL");
}

#[tokio::test]
async fn ask_without_principal_is_unauthorized() {
    let app = app();
    let question = json!({ "question": "Combien de clients ?" });

    let (status, _) = send(&app, "POST", "/api/ask", None, Some(question.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/api/ask", Some("ghost"), Some(question)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ask_returns_answer_and_sql() {
    let app = app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/ask",
        Some("alice"),
        Some(json!({ "question": "Combien de clients actifs à Paris ?", "session_id": "s-1" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "s-1");
    assert_eq!(body["answer"], "Il y a 3 clients actifs à Paris.");
    assert!(body["sql"].as_str().unwrap().contains("FROM clients"));
    assert!(body.get("rejection").is_none());
}

#[tokio::test]
async fn refused_question_is_ok_with_null_sql() {
    let app = app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/ask",
        Some("alice"),
        Some(json!({ "question": "Supprime tous les clients" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sql"], Value::Null);
    assert_eq!(body["rejection"]["kind"]["type"], "input");
}

#[tokio::test]
async fn empty_question_is_bad_request() {
    let app = app();
    register(&app, "alice").await;

    let (status, body) = send(&app, "POST", "/api/ask", Some("alice"), Some(json!({ "question": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn admin_routes_require_admin() {
    let app = app();
    register(&app, "alice").await;
    register(&app, "bob").await;

    let (status, _) = send(&app, "GET", "/api/admin/principals", Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/admin/principals", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principals"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn admin_narrows_tables_then_user_is_refused_foreign_join() {
    let app = app();
    register(&app, "alice").await;
    register(&app, "bob").await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/admin/principals/bob/tables",
        Some("alice"),
        Some(json!({ "allowed_tables": ["commandes"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed_tables"], json!(["commandes"]));

    // The canned generator always queries `clients`.
    let (status, body) = send(
        &app,
        "POST",
        "/api/ask",
        Some("bob"),
        Some(json!({ "question": "Combien de clients actifs à Paris ?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sql"], Value::Null);
    assert_eq!(body["rejection"]["kind"]["type"], "unauthorized_tables");
}

#[tokio::test]
async fn unknown_tables_are_bad_request() {
    let app = app();
    register(&app, "alice").await;
    register(&app, "bob").await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/admin/principals/bob/tables",
        Some("alice"),
        Some(json!({ "allowed_tables": ["ventes"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNKNOWN_TABLES");
}

#[tokio::test]
async fn admin_cannot_demote_self() {
    let app = app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/admin/principals/alice/role",
        Some("alice"),
        Some(json!({ "role": "user" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "SELF_DEMOTION");
}

#[tokio::test]
async fn promotion_unlocks_admin_routes() {
    let app = app();
    register(&app, "alice").await;
    register(&app, "bob").await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/admin/principals/bob/role",
        Some("alice"),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, _) = send(&app, "GET", "/api/admin/principals", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
}
