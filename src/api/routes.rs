use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{self, agents, missions, reports};
use super::state::AppState;

/// Builds the HTTP router over a shared roster
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Agent routes
        .route(
            "/api/agents",
            get(agents::list_agents).post(agents::create_agent),
        )
        .route(
            "/api/agents/:id",
            get(agents::get_agent)
                .put(agents::update_agent)
                .delete(agents::delete_agent),
        )
        .route("/api/agents/:id/status", get(agents::get_agent_status))
        .route("/api/agents/:id/history", get(agents::get_agent_history))
        // Mission routes
        .route(
            "/api/missions",
            get(missions::list_missions).post(missions::create_mission),
        )
        .route("/api/missions/:id", get(missions::get_mission))
        .route("/api/missions/:id/start", post(missions::start_mission))
        .route("/api/missions/:id/complete", post(missions::complete_mission))
        .route("/api/missions/:id/extend", post(missions::extend_mission))
        .route("/api/missions/:id/agents", get(missions::get_mission_agents))
        // Reports
        .route("/api/history", get(reports::get_history))
        .route("/api/dashboard", get(reports::get_dashboard))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
