// src/config/endpoint.rs
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use super::ConfigError;

pub const ENV_CONFIG_PATH: &str = "PAPERLESS_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/paperless.toml";

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_name() -> String {
    "Paperless Status".to_string()
}
fn default_scan_interval_secs() -> u64 {
    60
}
fn default_timeout_secs() -> u64 {
    10
}

/// Connection settings for one Paperless-ngx server.
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub token: String,
    /// Friendly name shown on the dashboard.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    /// Per-request bound; distinct from the scan interval.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ssl: false,
            token: String::new(),
            name: default_name(),
            scan_interval_secs: default_scan_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EndpointConfig {
    pub fn new(host: impl Into<String>, port: u16, ssl: bool, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            ssl,
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    pub fn unique_id(&self) -> String {
        format!("paperless_status_{}_{}", self.host, self.port)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }

    /// Parse a TOML document. Missing keys fall back to defaults; validation
    /// is left to the caller so env overrides can still fill the gaps.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&data)
    }

    /// Load using env var + fallbacks, then apply `PAPERLESS_*` overrides:
    /// 1) $PAPERLESS_CONFIG_PATH (must exist)
    /// 2) config/paperless.toml (optional)
    /// 3) defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(ConfigError::Read {
                        path: pb.display().to_string(),
                        reason: format!("{ENV_CONFIG_PATH} points to non-existent path"),
                    });
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
                if fallback.exists() {
                    Self::load_from_file(&fallback)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(host) = env_non_empty("PAPERLESS_HOST") {
            self.host = host;
        }
        if let Some(port) = env_non_empty("PAPERLESS_PORT") {
            self.port = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        if let Some(ssl) = env_non_empty("PAPERLESS_SSL") {
            self.ssl = parse_bool(&ssl);
        }
        if let Some(token) = env_non_empty("PAPERLESS_TOKEN") {
            self.token = token;
        }
        if let Some(name) = env_non_empty("PAPERLESS_NAME") {
            self.name = name;
        }
        if let Some(secs) = env_non_empty("PAPERLESS_SCAN_INTERVAL_SECS") {
            self.scan_interval_secs = secs
                .parse()
                .map_err(|_| ConfigError::Parse(format!("PAPERLESS_SCAN_INTERVAL_SECS={secs}")))?;
        }
        if let Some(secs) = env_non_empty("PAPERLESS_TIMEOUT_SECS") {
            self.timeout_secs = secs
                .parse()
                .map_err(|_| ConfigError::Parse(format!("PAPERLESS_TIMEOUT_SECS={secs}")))?;
        }
        Ok(())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
