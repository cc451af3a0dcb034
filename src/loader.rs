//! One-liner generation for client bootstrap.
//!
//! Pure string construction over a client record and the callback URL the
//! operator's server exposes. The loader script body itself is served (and
//! versioned) elsewhere; this module only renders the single command an
//! operator pastes on a machine they manage to fetch and run it.

use crate::db::models::{Client, Loader};

/// Render the bootstrap one-liner for a client.
pub fn get_oneliner(client: &Client, loader_url: &str) -> String {
    match client.loader {
        Loader::Ps1 => format!(
            "powershell -NoProfile -Command \"(New-Object Net.WebClient).DownloadString('{}') | Invoke-Expression\"",
            loader_url
        ),
    }
}

/// URL path under which a client's loader script is exposed.
pub fn loader_path(client: &Client) -> String {
    format!("/clients/{}/loader", client.client_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Cpu, Loader, Method, Platform, Protocol};
    use chrono::Utc;

    fn ps1_client() -> Client {
        Client {
            id: 1,
            client_id: "ABCD".to_string(),
            title: None,
            date_created: Utc::now(),
            date_connected: None,
            date_disconnected: None,
            platform: Platform::Windows,
            cpu: Cpu::X64,
            loader: Loader::Ps1,
            protocol: Protocol::Ws,
            method: Method::Connect,
        }
    }

    #[test]
    fn test_oneliner_embeds_loader_url() {
        let client = ps1_client();
        let one_liner = get_oneliner(&client, "http://127.0.0.1:8000/clients/ABCD/loader");

        assert!(one_liner.starts_with("powershell"));
        assert!(one_liner.contains("http://127.0.0.1:8000/clients/ABCD/loader"));
    }

    #[test]
    fn test_oneliner_is_deterministic() {
        let client = ps1_client();
        let url = "http://example.test/clients/ABCD/loader";

        assert_eq!(get_oneliner(&client, url), get_oneliner(&client, url));
    }

    #[test]
    fn test_loader_path() {
        assert_eq!(loader_path(&ps1_client()), "/clients/ABCD/loader");
    }
}
