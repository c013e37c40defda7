//! Shared HTTP session.
//!
//! Every backend client is built on the same `reqwest::Client` with a cookie
//! store, so the session cookie set by login rides along on later calls.

use anyhow::{Context, Result};
use reqwest::Client;
use url::Url;

use crate::config::BackendConfig;

/// Build the cookie-carrying client shared by all backend clients.
pub fn session_client(backend: &BackendConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .cookie_store(true)
        .user_agent(concat!("skyfav/", env!("CARGO_PKG_VERSION")));

    if let Some(timeout) = backend.request_timeout() {
        builder = builder.timeout(timeout);
    }

    if cfg!(debug_assertions) && backend.allow_invalid_certs {
        tracing::warn!("TLS certificate validation disabled for backend requests");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().context("Failed to create HTTP client")
}

/// Parse a base URL and make sure it ends with `/` so `Url::join` appends
/// instead of replacing the last segment.
pub fn base_url(raw: &str) -> Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&with_slash).with_context(|| format!("Invalid base URL: {}", raw))
}
