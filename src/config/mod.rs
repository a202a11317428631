// src/config/mod.rs
pub mod endpoint;

pub use endpoint::EndpointConfig;

use std::net::SocketAddr;

pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config from {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("invalid config: {0}")]
    Parse(String),
    #[error("host must not be empty")]
    EmptyHost,
    #[error("port must be within 1-65535, got {0}")]
    InvalidPort(String),
    #[error("API token is required (PAPERLESS_TOKEN or `token` in the config file)")]
    MissingToken,
    #[error("invalid {ENV_BIND_ADDR}: {0}")]
    BindAddr(String),
}

/// Address the status API listens on.
pub fn bind_addr_from_env() -> Result<SocketAddr, ConfigError> {
    let raw = std::env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::BindAddr(raw.clone()))
}
