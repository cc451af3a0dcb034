use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::models::Client;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// API error response
#[derive(Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// A client record annotated with its live connection state.
#[derive(Serialize)]
pub struct ClientSummary {
    #[serde(flatten)]
    pub client: Client,
    pub connected: bool,
}

/// Single-client view: the record, its live state, and the bootstrap
/// one-liner rendered for this server's public URL.
#[derive(Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub connected: bool,
    pub one_liner: String,
}

/// Directory listing request submitted from the client view.
#[derive(Deserialize)]
pub struct DirectoryListingRequest {
    pub directory: String,
}

#[derive(Serialize)]
pub struct DirectoryListingResponse {
    pub client_id: String,
    pub directory: String,
    pub entries: Vec<String>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}
