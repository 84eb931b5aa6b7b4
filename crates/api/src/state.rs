use std::sync::Arc;

use scrappy_core::orchestrator::JobOrchestrator;
use scrappy_core::registry::JobRegistry;

use crate::auth::store::UserStore;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already
/// `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// In-memory credential store.
    pub users: Arc<UserStore>,
    /// Shared job table, read by the polling endpoints.
    pub registry: Arc<JobRegistry>,
    /// Job submission and background execution coordinator.
    pub orchestrator: JobOrchestrator,
}
