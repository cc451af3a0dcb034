//! CRUD over persisted client records.
//!
//! The short `client_id` is generated here at creation time and never
//! reassigned. Connection lifecycle timestamps are updated only through
//! `mark_connected` / `mark_disconnected`, which the transport layer calls.

use chrono::Utc;
use rand::Rng;
use sqlx::SqlitePool;

use crate::db::models::{Client, NewClient};
use crate::error::{ConsoleError, Result};

/// Alphabet for generated client ids. Ambiguous glyphs (0/O, 1/I) are left
/// out because operators read these ids off a screen and type them back.
const CLIENT_ID_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CLIENT_ID_LEN: usize = 4;

/// How many times to retry id generation on a unique-constraint collision
/// before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

pub struct ClientManager<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ClientManager<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a client record with a freshly generated id.
    pub async fn add_client(&self, new: NewClient) -> Result<Client> {
        let now = Utc::now();

        for _ in 0..MAX_ID_ATTEMPTS {
            let client_id = make_client_id();

            let result = sqlx::query(
                r#"
                INSERT INTO clients (client_id, title, date_created, platform, cpu, loader, protocol, method)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&client_id)
            .bind(&new.title)
            .bind(now)
            .bind(new.platform)
            .bind(new.cpu)
            .bind(new.loader)
            .bind(new.protocol)
            .bind(new.method)
            .execute(self.pool)
            .await;

            match result {
                Ok(_) => return self.get_client(&client_id).await,
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    tracing::debug!("Client id collision on {}, retrying", client_id);
                    continue;
                },
                Err(e) => return Err(e.into()),
            }
        }

        Err(ConsoleError::Validation(
            "Failed to generate a unique client id".to_string(),
        ))
    }

    /// Fetch a single record by its short id.
    pub async fn get_client(&self, client_id: &str) -> Result<Client> {
        let client: Option<Client> = sqlx::query_as("SELECT * FROM clients WHERE client_id = ?")
            .bind(client_id)
            .fetch_optional(self.pool)
            .await?;

        client.ok_or_else(|| ConsoleError::ClientUnknown(client_id.to_string()))
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        let clients: Vec<Client> = sqlx::query_as("SELECT * FROM clients ORDER BY id")
            .fetch_all(self.pool)
            .await?;

        Ok(clients)
    }

    /// Record that the client's live connection came up.
    pub async fn mark_connected(&self, client_id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE clients SET date_connected = ? WHERE client_id = ?")
            .bind(Utc::now())
            .bind(client_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ConsoleError::ClientUnknown(client_id.to_string()));
        }
        Ok(())
    }

    /// Record that the client's live connection went away.
    pub async fn mark_disconnected(&self, client_id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE clients SET date_disconnected = ? WHERE client_id = ?")
            .bind(Utc::now())
            .bind(client_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ConsoleError::ClientUnknown(client_id.to_string()));
        }
        Ok(())
    }
}

/// Generate a short random client id.
fn make_client_id() -> String {
    let mut rng = rand::rng();
    (0..CLIENT_ID_LEN)
        .map(|_| CLIENT_ID_CHARSET[rng.random_range(0..CLIENT_ID_CHARSET.len())] as char)
        .collect()
}
