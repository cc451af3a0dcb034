//! In-memory session registry and command dispatcher.
//!
//! Maps a short client id to the live connection handle the transport layer
//! registered for it. A record can exist with no entry here (never connected,
//! or gone again); an entry only exists while a connection is live. The
//! registry is an explicitly constructed value injected into server state,
//! shared by cloning.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::error::{ConsoleError, Result};

/// Commands queued per connection before backpressure kicks in.
pub const COMMAND_BUFFER: usize = 8;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest directory path we accept from the dashboard form.
const MAX_PATH_LEN: usize = 1024;

/// A command forwarded to a live agent connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListDirectory { path: String },
}

/// What a command produced on the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    DirectoryListing(Vec<String>),
}

/// A dispatched command plus the slot its result lands in. The transport
/// answers with `Err(DispatchFailure)` when the remote side reports a
/// failure; dropping `reply` without answering also counts as a failure.
#[derive(Debug)]
pub struct CommandRequest {
    pub command: Command,
    pub reply: oneshot::Sender<Result<CommandOutput>>,
}

/// Live connection capability for one client: a sender into the transport
/// task that owns the socket.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<CommandRequest>,
    pub connected_at: DateTime<Utc>,
}

impl SessionHandle {
    pub fn new(tx: mpsc::Sender<CommandRequest>) -> Self {
        Self {
            tx,
            connected_at: Utc::now(),
        }
    }

    /// Build a handle together with the receiving end the transport (or a
    /// test double) drains.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<CommandRequest>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
    command_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_COMMAND_TIMEOUT)
    }

    pub fn with_timeout(command_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            command_timeout,
        }
    }

    /// Insert the handle for a freshly connected client, replacing any stale
    /// entry left by an earlier connection.
    pub async fn register(&self, client_id: &str, handle: SessionHandle) {
        let previous = self
            .sessions
            .write()
            .await
            .insert(client_id.to_string(), handle);

        if previous.is_some() {
            tracing::info!("Replaced stale session for client {}", client_id);
        } else {
            tracing::info!("Registered session for client {}", client_id);
        }
    }

    /// Remove the entry for a disconnected client. Idempotent: deregistering
    /// an absent id is a no-op and returns false.
    pub async fn deregister(&self, client_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(client_id).is_some();
        if removed {
            tracing::info!("Deregistered session for client {}", client_id);
        }
        removed
    }

    /// Remove the entry for a client only if it still belongs to the given
    /// handle. A transport task tearing down must not evict the replacement
    /// session that superseded it.
    pub async fn deregister_handle(&self, client_id: &str, handle: &SessionHandle) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(client_id) {
            Some(current) if current.tx.same_channel(&handle.tx) => {
                sessions.remove(client_id);
                tracing::info!("Deregistered session for client {}", client_id);
                true
            },
            _ => false,
        }
    }

    /// Look up the live handle for a client, if any. Holds the lock only for
    /// the map read.
    pub async fn lookup(&self, client_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(client_id).cloned()
    }

    pub async fn is_connected(&self, client_id: &str) -> bool {
        self.sessions.read().await.contains_key(client_id)
    }

    pub async fn connected_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Ask the client to enumerate a directory and wait for the result.
    ///
    /// Absent entry (or a connection already torn down) is `ClientOffline`;
    /// no result within the configured timeout is `DispatchTimeout`; a
    /// connection dropped mid-request is `DispatchFailure`. The registry lock
    /// is released before the network round trip starts.
    pub async fn list_directory(&self, client_id: &str, path: &str) -> Result<Vec<String>> {
        let path = validate_directory_path(path)?;

        let handle = self
            .lookup(client_id)
            .await
            .ok_or_else(|| ConsoleError::ClientOffline(client_id.to_string()))?;

        let (reply, response) = oneshot::channel();
        let request = CommandRequest {
            command: Command::ListDirectory { path },
            reply,
        };

        // The timeout covers the whole round trip, queueing included: a
        // stalled transport task with a full command buffer would otherwise
        // park the caller in the channel send indefinitely.
        let dispatch = async {
            // Send failing means the transport task is gone but cleanup has
            // not run yet; callers see the same state as "never connected".
            handle
                .tx
                .send(request)
                .await
                .map_err(|_| ConsoleError::ClientOffline(client_id.to_string()))?;

            response.await.map_err(|_| {
                ConsoleError::DispatchFailure(format!(
                    "connection to client {} closed before it replied",
                    client_id
                ))
            })?
        };

        match tokio::time::timeout(self.command_timeout, dispatch).await {
            Err(_) => Err(ConsoleError::DispatchTimeout(client_id.to_string())),
            Ok(result) => match result? {
                CommandOutput::DirectoryListing(entries) => Ok(entries),
            },
        }
    }
}

/// Sanity-check a caller-supplied directory path before it goes anywhere
/// near the remote side. The path refers to the *client's* filesystem, so we
/// only do lexical checks: non-empty, printable, bounded, and free of parent
/// traversal segments in either separator convention.
pub fn validate_directory_path(path: &str) -> Result<String> {
    let path = path.trim();

    if path.is_empty() {
        return Err(ConsoleError::Validation(
            "Directory path must not be empty".to_string(),
        ));
    }
    if path.len() > MAX_PATH_LEN {
        return Err(ConsoleError::Validation(format!(
            "Directory path exceeds {} characters",
            MAX_PATH_LEN
        )));
    }
    if path.chars().any(|c| c.is_control()) {
        return Err(ConsoleError::Validation(
            "Directory path contains control characters".to_string(),
        ));
    }
    if path
        .split(|c| c == '/' || c == '\\')
        .any(|segment| segment == "..")
    {
        return Err(ConsoleError::Validation(
            "Directory path must not contain parent traversal".to_string(),
        ));
    }

    Ok(path.to_string())
}
