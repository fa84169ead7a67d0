use datagate_core::Principal;
use datagate_policy::PrincipalRegistry;
use datagate_runtime::Orchestrator;
use tokio::sync::RwLock;

use crate::error::ApiError;

/// Shared application state.
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Principals are few and mutated only by admin routes.
    pub registry: RwLock<PrincipalRegistry>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, registry: PrincipalRegistry) -> Self {
        Self {
            orchestrator,
            registry: RwLock::new(registry),
        }
    }

    /// Snapshot of the caller, as known right now.
    pub async fn principal(&self, id: &str) -> Result<Principal, ApiError> {
        self.registry
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}
