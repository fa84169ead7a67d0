//! Datagate HTTP surface.
//!
//! The caller is identified by the `x-principal-id` header, which a trusted
//! gateway sets after authenticating the user. This service does no
//! authentication of its own.

pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/ask", post(handlers::ask))
        .route("/api/register", post(handlers::register))
        .route("/api/admin/principals", get(handlers::list_principals))
        .route("/api/admin/principals/{id}/role", put(handlers::update_role))
        .route(
            "/api/admin/principals/{id}/tables",
            put(handlers::update_tables),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
