//! HTTP API integration tests: client CRUD, loader one-liner rendering, and
//! the error codes the dashboard surfaces for each failure kind.

mod common;

use std::time::Duration;

use common::{create_client, spawn_server};

#[tokio::test]
async fn test_health_endpoint() {
    let server = spawn_server(Duration::from_secs(5)).await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{}/api/health", server.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "agent-console");
}

#[tokio::test]
async fn test_create_and_list_clients() {
    let server = spawn_server(Duration::from_secs(5)).await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{}/api/clients", server.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let client_id = create_client(&http, &server.base_url).await;
    assert_eq!(client_id.len(), 4);

    let body: serde_json::Value = http
        .get(format!("{}/api/clients", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let listed = body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["client_id"], client_id.as_str());
    assert_eq!(listed[0]["title"], "test box");
    assert_eq!(listed[0]["platform"], "windows");
    assert_eq!(listed[0]["connected"], false);
}

#[tokio::test]
async fn test_client_view_renders_oneliner() {
    let server = spawn_server(Duration::from_secs(5)).await;
    let http = reqwest::Client::new();
    let client_id = create_client(&http, &server.base_url).await;

    let response = http
        .get(format!("{}/api/clients/{}", server.base_url, client_id))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let one_liner = body["data"]["one_liner"].as_str().unwrap();

    assert!(one_liner.starts_with("powershell"));
    assert!(one_liner.contains(&server.base_url));
    assert!(one_liner.contains(&format!("/clients/{}/loader", client_id)));
}

#[tokio::test]
async fn test_view_unknown_client_is_404() {
    let server = spawn_server(Duration::from_secs(5)).await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{}/api/clients/ZZZZ", server.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "CLIENT_UNKNOWN");
}

#[tokio::test]
async fn test_create_client_rejects_unknown_enum_value() {
    let server = spawn_server(Duration::from_secs(5)).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{}/api/clients", server.base_url))
        .json(&serde_json::json!({
            "platform": "linux",
            "cpu": "x64"
        }))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_directory_listing_offline_vs_unknown() {
    let server = spawn_server(Duration::from_secs(5)).await;
    let http = reqwest::Client::new();
    let client_id = create_client(&http, &server.base_url).await;

    // Known record, no live connection
    let response = http
        .post(format!(
            "{}/api/clients/{}/directory",
            server.base_url, client_id
        ))
        .json(&serde_json::json!({"directory": "C:\\"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "CLIENT_OFFLINE");

    // No record at all: a different failure kind
    let response = http
        .post(format!("{}/api/clients/ZZZZ/directory", server.base_url))
        .json(&serde_json::json!({"directory": "C:\\"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "CLIENT_UNKNOWN");
}

#[tokio::test]
async fn test_directory_listing_rejects_traversal() {
    let server = spawn_server(Duration::from_secs(5)).await;
    let http = reqwest::Client::new();
    let client_id = create_client(&http, &server.base_url).await;

    let response = http
        .post(format!(
            "{}/api/clients/{}/directory",
            server.base_url, client_id
        ))
        .json(&serde_json::json!({"directory": "C:\\data\\..\\secrets"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let server = spawn_server(Duration::from_secs(5)).await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{}/api/no-such-route", server.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}
