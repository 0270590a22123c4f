//! Shared HTTP plumbing for the outbound service clients

use reqwest::Client;
use std::time::Duration;

use crate::error::{Error, Result};

/// Build the process-wide pooled client
///
/// Every provider clones this handle; per-call timeouts are set on each request.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(16)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))
}

/// Read an API key from the environment, ignoring blank values
pub fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a required API key
pub fn require_api_key(var: &str) -> Result<String> {
    api_key_from_env(var)
        .ok_or_else(|| Error::config(format!("Required environment variable '{}' is not set", var)))
}

/// Join a base URL and a path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
