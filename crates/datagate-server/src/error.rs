//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use datagate_policy::{PolicyError, PolicyErrorKind};
use datagate_runtime::PipelineError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unknown `x-principal-id`.
    #[error("authentication required")]
    Unauthenticated,

    #[error("administrator role required")]
    Forbidden,

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Policy(e) => match e.kind {
                PolicyErrorKind::PrincipalNotFound => StatusCode::NOT_FOUND,
                PolicyErrorKind::DuplicatePrincipal => StatusCode::CONFLICT,
                PolicyErrorKind::AdminRequired => StatusCode::FORBIDDEN,
                PolicyErrorKind::InvalidPrincipalId
                | PolicyErrorKind::SelfDemotion
                | PolicyErrorKind::EmptyTableSet
                | PolicyErrorKind::UnknownTables => StatusCode::BAD_REQUEST,
            },
            ApiError::Pipeline(e) => match e {
                PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                PipelineError::NoTableAccess(_) => StatusCode::FORBIDDEN,
                PipelineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::Forbidden => "ADMIN_REQUIRED",
            ApiError::Policy(e) => e.code(),
            ApiError::Pipeline(e) => e.code(),
        }
    }

    /// Message shown to the caller. Collaborator failures stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::Pipeline(e) if !e.is_client_error() => match e {
                PipelineError::Timeout { .. } => e.to_string(),
                _ => "internal error".to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = ?self, "request failed");
        }
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            }
        });
        (status, Json(body)).into_response()
    }
}
