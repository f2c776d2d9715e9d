// API layer module (HTTP adapters)
// Handlers build repositories over the shared pool per request

pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::SqlitePool;

use handlers::{health, members, teams};

/// Routes of the service, with the pool as shared state
///
/// Middleware (tracing, CORS) is layered on by the caller.
pub fn router(pool: SqlitePool) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Team routes
        .route("/api/teams", post(teams::create_team).get(teams::list_teams))
        .route("/api/teams/:id", get(teams::get_team).delete(teams::delete_team))
        // Member routes
        .route("/api/members", post(members::create_member))
        .route("/api/members/:id", get(members::get_member))
        .route("/api/members/:id/team", put(members::change_team))
        // Search routes
        .route("/v1/members", get(members::search_members_v1))
        .route("/v2/members", get(members::search_members_v2))
        .route("/v3/members", get(members::search_members_v3))
        .with_state(pool)
}
