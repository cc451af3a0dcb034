use anyhow::{Context, Result};
use axum::{
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::db;
use crate::registry::SessionRegistry;

/// Dashboard server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub registry: SessionRegistry,
    /// Base URL under which this server is reachable from the outside;
    /// loader one-liners are rendered against it.
    pub public_url: String,
}

/// Dashboard server instance
pub struct DashboardServer {
    host: String,
    port: u16,
    db_path: PathBuf,
    public_url: Option<String>,
    command_timeout: Duration,
}

impl DashboardServer {
    pub fn new(
        host: String,
        port: u16,
        db_path: PathBuf,
        public_url: Option<String>,
        command_timeout: Duration,
    ) -> Self {
        Self {
            host,
            port,
            db_path,
            public_url,
            command_timeout,
        }
    }

    /// Run the Dashboard server
    pub async fn run(self) -> Result<()> {
        let db_pool = db::create_pool(&self.db_path)
            .await
            .context("Failed to open database")?;
        db::run_migrations(&db_pool)
            .await
            .context("Failed to run migrations")?;

        let addr = format!("{}:{}", self.host, self.port);
        let public_url = self
            .public_url
            .unwrap_or_else(|| format!("http://{}", addr));

        let state = AppState {
            db_pool,
            registry: SessionRegistry::with_timeout(self.command_timeout),
            public_url,
        };

        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        tracing::info!("Agent console listening on {}", addr);
        tracing::info!("Database: {}", self.db_path.display());

        axum::serve(listener, app).await.context("Server error")?;

        Ok(())
    }
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    use super::{routes, transport};

    let static_dir = PathBuf::from("static");

    Router::new()
        // Root route - serve the dashboard page
        .route("/", get(serve_index))
        // Static files under /static prefix
        .nest_service("/static", ServeDir::new(static_dir))
        // API routes under /api prefix
        .nest("/api", routes::api_routes())
        // Agent transport endpoint
        .route(
            "/ws/agent/:client_id",
            get(transport::handle_agent_websocket),
        )
        // Fallback to 404
        .fallback(not_found_handler)
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Serve the main index.html file
async fn serve_index() -> impl IntoResponse {
    match tokio::fs::read_to_string("static/index.html").await {
        Ok(content) => Html(content).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Error: index.html not found</h1>".to_string()),
        )
            .into_response(),
    }
}

/// 404 Not Found handler
async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Not found",
            "code": "NOT_FOUND"
        })),
    )
}
