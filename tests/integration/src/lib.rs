//! Integration tests for the TissDB Lite server.
//!
//! These tests require a running `tissdb-lite-server` at `localhost:9877`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p tissdb-lite-integration -- --ignored
//! ```

use std::sync::Once;

use anyhow::Result;
use serde_json::Value;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Base URL of the server.
fn endpoint_url() -> String {
    std::env::var("TISSDB_LITE_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:9877".to_owned())
}

/// A thin client for the `POST /command` endpoint.
#[derive(Debug, Clone)]
pub struct CommandClient {
    http: reqwest::Client,
    base: String,
}

/// Status code and decoded JSON body of a response.
#[derive(Debug)]
pub struct Reply {
    /// HTTP status.
    pub status: u16,
    /// Decoded body.
    pub body: Value,
}

impl CommandClient {
    /// Create a client pointing at the local server.
    #[must_use]
    pub fn new() -> Self {
        init_tracing();
        Self {
            http: reqwest::Client::new(),
            base: endpoint_url(),
        }
    }

    /// Send a command body.
    pub async fn send(&self, command: &Value) -> Result<Reply> {
        self.post_raw("/command", command.to_string()).await
    }

    /// Send a raw body to an arbitrary path.
    pub async fn post_raw(&self, path: &str, body: String) -> Result<Reply> {
        let resp = self
            .http
            .post(format!("{}{path}", self.base))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.json::<Value>().await?;
        tracing::debug!(status, %body, "reply");
        Ok(Reply { status, body })
    }
}

impl Default for CommandClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a unique collection name for a test.
#[must_use]
pub fn test_collection_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_owned();
    format!("test_{prefix}_{id}")
}

#[cfg(test)]
mod test_command;
