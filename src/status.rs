//! Sensor state: the status enum, the closed failure taxonomy, and the
//! attribute set exposed to the dashboard.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::change_detector::{KnownDocuments, NewDocumentEvent};
use crate::config::EndpointConfig;

pub const UNAUTHORIZED_MESSAGE: &str = "invalid authentication token";
pub const TIMEOUT_MESSAGE: &str = "connection timeout";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SensorStatus {
    #[default]
    Unknown,
    Online,
    Offline,
    Unauthorized,
    Error,
    Timeout,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Unknown => "Unknown",
            SensorStatus::Online => "Online",
            SensorStatus::Offline => "Offline",
            SensorStatus::Unauthorized => "Unauthorized",
            SensorStatus::Error => "Error",
            SensorStatus::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a poll can fail. Callers match on this exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollFailure {
    /// 401 from the server: bad token, retrying will not help.
    Unauthorized,
    /// Any other non-200 status.
    HttpStatus(u16),
    /// DNS, refused, reset.
    Offline(String),
    /// Round trip exceeded its bound.
    Timeout,
    /// 200 but the body was not the expected shape.
    Payload(String),
    /// Anything uncategorised.
    Unexpected(String),
}

impl PollFailure {
    pub fn status(&self) -> SensorStatus {
        match self {
            PollFailure::Unauthorized => SensorStatus::Unauthorized,
            PollFailure::HttpStatus(_) => SensorStatus::Error,
            PollFailure::Offline(_) => SensorStatus::Offline,
            PollFailure::Timeout => SensorStatus::Timeout,
            PollFailure::Payload(_) => SensorStatus::Error,
            PollFailure::Unexpected(_) => SensorStatus::Error,
        }
    }

    /// Text stored in `last_error`.
    pub fn message(&self) -> String {
        match self {
            PollFailure::Unauthorized => UNAUTHORIZED_MESSAGE.to_string(),
            PollFailure::HttpStatus(code) => format!("HTTP {code}"),
            PollFailure::Offline(msg) => msg.clone(),
            PollFailure::Timeout => TIMEOUT_MESSAGE.to_string(),
            PollFailure::Payload(msg) => format!("unexpected response: {msg}"),
            PollFailure::Unexpected(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for PollFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for PollFailure {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SensorAttributes {
    pub documents_count: u64,
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_untagged: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_used: Option<String>,
}

/// Outcome of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub status: SensorStatus,
    pub attributes: SensorAttributes,
    pub new_documents: Vec<NewDocumentEvent>,
}

/// Everything that survives between polls. Owned by whoever drives the
/// poller and handed to it by `&mut` on each poll.
#[derive(Debug, Clone, Default)]
pub struct SensorState {
    pub status: SensorStatus,
    pub attributes: SensorAttributes,
    pub known: KnownDocuments,
    pub last_polled: Option<DateTime<Utc>>,
}

impl SensorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_online(&mut self, documents_count: u64) {
        self.status = SensorStatus::Online;
        self.attributes.documents_count = documents_count;
        self.attributes.last_error = None;
    }

    /// Count and extras are left as they were so the dashboard keeps the
    /// last known figures while the server is unreachable.
    pub fn record_failure(&mut self, failure: &PollFailure) {
        self.status = failure.status();
        self.attributes.last_error = Some(failure.message());
    }

    pub fn snapshot(&self, cfg: &EndpointConfig) -> SensorSnapshot {
        SensorSnapshot {
            name: cfg.name.clone(),
            unique_id: cfg.unique_id(),
            state: self.status,
            attributes: self.attributes.clone(),
            last_polled: self.last_polled,
        }
    }
}

/// Read-only view served to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub name: String,
    pub unique_id: String,
    pub state: SensorStatus,
    pub attributes: SensorAttributes,
    pub last_polled: Option<DateTime<Utc>>,
}
