use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use super::models::*;
use super::server::AppState;
use crate::clients::ClientManager;
use crate::db::models::NewClient;
use crate::error::ConsoleError;
use crate::loader;

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "agent-console".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List all client records with their live connection state
pub async fn list_clients(State(state): State<AppState>) -> Response {
    let mgr = ClientManager::new(&state.db_pool);

    let clients = match mgr.list_clients().await {
        Ok(clients) => clients,
        Err(e) => {
            tracing::error!("Failed to list clients: {}", e);
            return error_response(e);
        },
    };

    let mut summaries = Vec::with_capacity(clients.len());
    for client in clients {
        let connected = state.registry.is_connected(&client.client_id).await;
        summaries.push(ClientSummary { client, connected });
    }

    (StatusCode::OK, Json(ApiResponse { data: summaries })).into_response()
}

/// Create a client record; the id is assigned by the server
pub async fn add_client(
    State(state): State<AppState>,
    Json(req): Json<NewClient>,
) -> Response {
    let mgr = ClientManager::new(&state.db_pool);

    match mgr.add_client(req).await {
        Ok(client) => {
            tracing::info!("Created client {}", client.client_id);
            (StatusCode::CREATED, Json(ApiResponse { data: client })).into_response()
        },
        Err(e) => {
            tracing::error!("Failed to create client: {}", e);
            error_response(e)
        },
    }
}

/// Single client view: record, live state, and the bootstrap one-liner
pub async fn view_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Response {
    let mgr = ClientManager::new(&state.db_pool);

    let client = match mgr.get_client(&client_id).await {
        Ok(client) => client,
        Err(e) => return error_response(e),
    };

    let loader_url = format!(
        "{}{}",
        state.public_url.trim_end_matches('/'),
        loader::loader_path(&client)
    );
    let one_liner = loader::get_oneliner(&client, &loader_url);
    let connected = state.registry.is_connected(&client.client_id).await;

    (
        StatusCode::OK,
        Json(ApiResponse {
            data: ClientDetail {
                client,
                connected,
                one_liner,
            },
        }),
    )
        .into_response()
}

/// Dispatch a directory listing to the client's live connection.
///
/// Unknown record and known-but-offline are separate outcomes here; the
/// record is checked first so a missing client never masquerades as a
/// disconnected one.
pub async fn request_directory_listing(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Json(req): Json<DirectoryListingRequest>,
) -> Response {
    let mgr = ClientManager::new(&state.db_pool);

    let client = match mgr.get_client(&client_id).await {
        Ok(client) => client,
        Err(e) => return error_response(e),
    };

    match state
        .registry
        .list_directory(&client.client_id, &req.directory)
        .await
    {
        Ok(entries) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: DirectoryListingResponse {
                    client_id: client.client_id,
                    directory: req.directory,
                    entries,
                },
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Directory listing for {} failed: {}", client.client_id, e);
            error_response(e)
        },
    }
}

/// Convert a crate error into the JSON error body plus its HTTP status.
pub fn error_response(e: ConsoleError) -> Response {
    let status = match &e {
        ConsoleError::ClientUnknown(_) => StatusCode::NOT_FOUND,
        ConsoleError::ClientOffline(_) => StatusCode::CONFLICT,
        ConsoleError::Validation(_) => StatusCode::BAD_REQUEST,
        ConsoleError::DispatchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ConsoleError::DispatchFailure(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ApiError {
            code: e.to_error_code().to_string(),
            message: e.to_string(),
            details: None,
        }),
    )
        .into_response()
}
