//! Common utilities for integration tests

use std::time::Duration;

use agent_console::dashboard::server::{create_router, AppState};
use agent_console::db::{create_pool, run_migrations};
use agent_console::registry::SessionRegistry;
use tempfile::TempDir;

/// An in-process dashboard server bound to an ephemeral port, backed by a
/// throwaway database.
pub struct TestServer {
    pub base_url: String,
    pub addr: std::net::SocketAddr,
    _db_dir: TempDir,
}

pub async fn spawn_server(command_timeout: Duration) -> TestServer {
    let db_dir = TempDir::new().unwrap();
    let pool = create_pool(&db_dir.path().join("console.db")).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = AppState {
        db_pool: pool,
        registry: SessionRegistry::with_timeout(command_timeout),
        public_url: format!("http://{}", addr),
    };
    let app = create_router(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        addr,
        _db_dir: db_dir,
    }
}

/// Create a client record through the API and return its generated id.
pub async fn create_client(http: &reqwest::Client, base_url: &str) -> String {
    let response = http
        .post(format!("{}/api/clients", base_url))
        .json(&serde_json::json!({
            "title": "test box",
            "platform": "windows",
            "cpu": "x64"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["data"]["client_id"].as_str().unwrap().to_string()
}

/// Poll the client view until its live state matches, or panic after ~2s.
pub async fn wait_for_connected(
    http: &reqwest::Client,
    base_url: &str,
    client_id: &str,
    expected: bool,
) {
    for _ in 0..40 {
        let body: serde_json::Value = http
            .get(format!("{}/api/clients/{}", base_url, client_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        if body["data"]["connected"].as_bool() == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!(
        "client {} never reached connected={} state",
        client_id, expected
    );
}
