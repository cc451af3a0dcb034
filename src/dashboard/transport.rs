//! Agent-facing WebSocket endpoint.
//!
//! This is the transport layer the registry depends on: it registers a
//! `SessionHandle` when an agent connects, forwards dispatched commands to
//! the socket as tagged JSON, correlates replies back to their callers by
//! request id, and deregisters on teardown. Per-client connect/disconnect is
//! serialized by this task; the registry always reflects the latest state.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::oneshot;

use super::handlers::error_response;
use super::server::AppState;
use crate::clients::ClientManager;
use crate::error::{ConsoleError, Result};
use crate::registry::{Command, CommandOutput, CommandRequest, SessionHandle, COMMAND_BUFFER};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Frames sent to the agent.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum AgentFrame {
    #[serde(rename = "list_directory")]
    ListDirectory { id: u64, path: String },
    #[serde(rename = "ping")]
    Ping,
}

/// Frames received from the agent.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AgentReply {
    #[serde(rename = "directory_listing")]
    DirectoryListing { id: u64, entries: Vec<String> },
    #[serde(rename = "error")]
    Error { id: u64, message: String },
    #[serde(rename = "pong")]
    Pong,
}

/// Handle agent WebSocket connections. Only known client records may
/// connect; anything else is rejected before the upgrade.
pub async fn handle_agent_websocket(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let mgr = ClientManager::new(&state.db_pool);

    match mgr.get_client(&client_id).await {
        Ok(client) => ws
            .on_upgrade(move |socket| agent_socket(socket, state, client.client_id))
            .into_response(),
        Err(e) => {
            tracing::warn!("Rejected agent connection for {}: {}", client_id, e);
            error_response(e)
        },
    }
}

async fn agent_socket(socket: WebSocket, state: AppState, client_id: String) {
    let (mut sender, mut receiver) = socket.split();
    let (handle, mut commands) = SessionHandle::channel(COMMAND_BUFFER);

    state.registry.register(&client_id, handle.clone()).await;
    {
        let mgr = ClientManager::new(&state.db_pool);
        if let Err(e) = mgr.mark_connected(&client_id).await {
            tracing::warn!("Failed to record connect time for {}: {}", client_id, e);
        }
    }
    tracing::info!("Agent connected: {}", client_id);

    // In-flight requests, keyed by the id we stamped on the outgoing frame
    let mut pending: HashMap<u64, oneshot::Sender<Result<CommandOutput>>> = HashMap::new();
    let mut next_id: u64 = 0;

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    // The first tick completes immediately; consume it so pings start after
    // one full interval
    heartbeat.tick().await;

    loop {
        tokio::select! {
            request = commands.recv() => {
                // None only once every sender clone is gone
                let Some(CommandRequest { command, reply }) = request else {
                    break;
                };

                next_id += 1;
                let frame = match &command {
                    Command::ListDirectory { path } => AgentFrame::ListDirectory {
                        id: next_id,
                        path: path.clone(),
                    },
                };

                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        let _ = reply.send(Err(ConsoleError::DispatchFailure(format!(
                            "failed to encode command: {}",
                            e
                        ))));
                        continue;
                    },
                };

                pending.insert(next_id, reply);
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<AgentReply>(&text) {
                            Ok(AgentReply::DirectoryListing { id, entries }) => {
                                match pending.remove(&id) {
                                    Some(reply) => {
                                        let _ = reply.send(Ok(
                                            CommandOutput::DirectoryListing(entries),
                                        ));
                                    },
                                    None => tracing::warn!(
                                        "Client {} answered unknown request id {}",
                                        client_id,
                                        id
                                    ),
                                }
                            },
                            Ok(AgentReply::Error { id, message }) => {
                                if let Some(reply) = pending.remove(&id) {
                                    let _ = reply
                                        .send(Err(ConsoleError::DispatchFailure(message)));
                                }
                            },
                            Ok(AgentReply::Pong) => {
                                tracing::trace!("Received pong from {}", client_id);
                            },
                            Err(e) => {
                                tracing::warn!(
                                    "Unparseable frame from client {}: {}",
                                    client_id,
                                    e
                                );
                            },
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error for client {}: {}", client_id, e);
                        break;
                    },
                }
            }

            _ = heartbeat.tick() => {
                let ping = serde_json::to_string(&AgentFrame::Ping).unwrap();
                if sender.send(Message::Text(ping)).await.is_err() {
                    break;
                }
                tracing::trace!("Sent heartbeat ping to {}", client_id);
            }
        }
    }

    // Teardown: remove our entry (but never a replacement session) and fail
    // any in-flight requests. The disconnect time is recorded only when this
    // task still owned the session; a superseded task stamping it would mark
    // a client whose replacement connection is live.
    let owned = state.registry.deregister_handle(&client_id, &handle).await;
    pending.clear();
    if owned {
        let mgr = ClientManager::new(&state.db_pool);
        if let Err(e) = mgr.mark_disconnected(&client_id).await {
            tracing::warn!("Failed to record disconnect time for {}: {}", client_id, e);
        }
        tracing::info!("Agent disconnected: {}", client_id);
    } else {
        tracing::debug!("Superseded transport task for {} exited", client_id);
    }
}
