use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Target operating system of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Platform {
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Cpu {
    X86,
    X64,
}

/// Bootstrap mechanism used to bring the agent up on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Loader {
    Ps1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Protocol {
    Ws,
    Wss,
}

/// Connection direction: the agent dials in, or listens for us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Method {
    Connect,
    Bind,
}

/// Persisted client record.
///
/// `client_id` is assigned exactly once at creation and never changes,
/// independent of any live connection. `date_connected` and
/// `date_disconnected` are owned by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_connected: Option<DateTime<Utc>>,
    pub date_disconnected: Option<DateTime<Utc>>,
    pub platform: Platform,
    pub cpu: Cpu,
    pub loader: Loader,
    pub protocol: Protocol,
    pub method: Method,
}

/// Input for creating a client record. The add form only exposes title,
/// platform and cpu; the connection mechanics default to ps1/ws/connect.
#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    #[serde(default)]
    pub title: Option<String>,
    pub platform: Platform,
    pub cpu: Cpu,
    #[serde(default = "default_loader")]
    pub loader: Loader,
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,
    #[serde(default = "default_method")]
    pub method: Method,
}

fn default_loader() -> Loader {
    Loader::Ps1
}

fn default_protocol() -> Protocol {
    Protocol::Ws
}

fn default_method() -> Method {
    Method::Connect
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_serialization_is_lowercase() {
        assert_eq!(serde_json::to_string(&Platform::Windows).unwrap(), "\"windows\"");
        assert_eq!(serde_json::to_string(&Cpu::X64).unwrap(), "\"x64\"");
        assert_eq!(serde_json::to_string(&Loader::Ps1).unwrap(), "\"ps1\"");
        assert_eq!(serde_json::to_string(&Protocol::Wss).unwrap(), "\"wss\"");
        assert_eq!(serde_json::to_string(&Method::Bind).unwrap(), "\"bind\"");
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let result: std::result::Result<Platform, _> = serde_json::from_str("\"linux\"");
        assert!(result.is_err());

        let result: std::result::Result<Cpu, _> = serde_json::from_str("\"arm64\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_new_client_defaults() {
        let new: NewClient =
            serde_json::from_str(r#"{"platform": "windows", "cpu": "x86"}"#).unwrap();

        assert_eq!(new.title, None);
        assert_eq!(new.loader, Loader::Ps1);
        assert_eq!(new.protocol, Protocol::Ws);
        assert_eq!(new.method, Method::Connect);
    }
}
