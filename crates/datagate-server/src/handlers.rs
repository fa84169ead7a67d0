use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use datagate_core::{Principal, Role};
use datagate_guard::Rejection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Header set by the trusted gateway in front of this service.
pub const PRINCIPAL_HEADER: &str = "x-principal-id";

fn principal_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(PRINCIPAL_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::Unauthenticated)
}

async fn caller(state: &AppState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let id = principal_id(headers)?;
    state.principal(&id).await
}

async fn admin_caller(state: &AppState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let principal = caller(state, headers).await?;
    if !principal.is_admin() {
        return Err(ApiError::Forbidden);
    }
    Ok(principal)
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "datagate" }))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub session_id: String,
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let principal = caller(&state, &headers).await?;
    let outcome = state
        .orchestrator
        .run(&req.question, &principal, req.session_id.as_deref())
        .await?;

    Ok(Json(AskResponse {
        question: req.question,
        answer: outcome.answer,
        session_id: outcome.session_id,
        sql: outcome.sql,
        rejection: outcome.rejection,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub id: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Principal>), ApiError> {
    let principal = state.registry.write().await.register(&req.id)?;
    Ok((StatusCode::CREATED, Json(principal)))
}

#[derive(Debug, Serialize)]
pub struct PrincipalList {
    pub principals: Vec<Principal>,
}

pub async fn list_principals(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PrincipalList>, ApiError> {
    admin_caller(&state, &headers).await?;
    let principals = state
        .registry
        .read()
        .await
        .list()
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(PrincipalList { principals }))
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(target): Path<String>,
    Json(req): Json<RoleUpdate>,
) -> Result<Json<Principal>, ApiError> {
    let actor = admin_caller(&state, &headers).await?;
    let principal = state
        .registry
        .write()
        .await
        .set_role(&actor.id, &target, req.role)?;
    Ok(Json(principal))
}

#[derive(Debug, Deserialize)]
pub struct TablesUpdate {
    pub allowed_tables: Vec<String>,
}

pub async fn update_tables(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(target): Path<String>,
    Json(req): Json<TablesUpdate>,
) -> Result<Json<Principal>, ApiError> {
    let actor = admin_caller(&state, &headers).await?;
    let principal = state
        .registry
        .write()
        .await
        .set_allowed_tables(&actor.id, &target, &req.allowed_tables)?;
    Ok(Json(principal))
}
