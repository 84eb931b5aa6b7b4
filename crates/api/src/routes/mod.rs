pub mod auth;
pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/token               token issuance (public)
///
/// /jobs                     submit (POST, auth required)
/// /jobs/{id}                status poll (GET, auth required)
/// /jobs/{id}/result         result fetch (GET, auth required)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/jobs", jobs::router())
}
