use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::server::AppState;

/// Create API router with all endpoints
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/clients",
            get(handlers::list_clients).post(handlers::add_client),
        )
        .route("/clients/:client_id", get(handlers::view_client))
        .route(
            "/clients/:client_id/directory",
            post(handlers::request_directory_listing),
        )
}
