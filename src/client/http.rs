// src/client/http.rs
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::error::Error as _;

use super::types::{human_size, CountOnly, DocumentId, DocumentListing, ServerStatus};
use super::PaperlessApi;
use crate::config::EndpointConfig;
use crate::status::PollFailure;

const DOCUMENTS_PATH: &str = "/api/documents/";
const STATUS_PATH: &str = "/api/status/";

/// reqwest-backed Paperless client. Every request carries
/// `Authorization: Token <token>` and is bounded by the configured timeout.
#[derive(Clone)]
pub struct PaperlessClient {
    http: Client,
    base_url: String,
    token: String,
}

impl PaperlessClient {
    pub fn new(cfg: &EndpointConfig) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("paperless-status/", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url(),
            token: cfg.token.clone(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        self.http
            .get(url)
            .header(header::AUTHORIZATION, format!("Token {}", self.token))
    }

    async fn send_ok(&self, req: RequestBuilder) -> Result<reqwest::Response, PollFailure> {
        let response = req.send().await.map_err(classify_reqwest_error)?;
        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::UNAUTHORIZED => Err(PollFailure::Unauthorized),
            other => Err(PollFailure::HttpStatus(other.as_u16())),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, PollFailure> {
        let req = req.header(header::ACCEPT, "application/json");
        let response = self.send_ok(req).await?;
        let body = response.bytes().await.map_err(classify_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|e| PollFailure::Payload(e.to_string()))
    }

    pub async fn try_preview(&self, id: DocumentId) -> Result<Vec<u8>, PollFailure> {
        let path = format!("{DOCUMENTS_PATH}{id}/preview/");
        let response = self.send_ok(self.get(&path)).await?;
        let bytes = response.bytes().await.map_err(classify_reqwest_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PaperlessApi for PaperlessClient {
    // Newest first, so fresh uploads land on the one page we read.
    async fn list_documents(&self) -> Result<DocumentListing, PollFailure> {
        let req = self.get(DOCUMENTS_PATH).query(&[("ordering", "-id")]);
        self.get_json(req).await
    }

    async fn fetch_preview(&self, id: DocumentId) -> Option<String> {
        match self.try_preview(id).await {
            Ok(bytes) => Some(general_purpose::STANDARD.encode(bytes)),
            Err(err) => {
                tracing::warn!(document_id = id, error = %err, "preview fetch failed");
                None
            }
        }
    }

    async fn untagged_count(&self) -> Option<u64> {
        let req = self
            .get(DOCUMENTS_PATH)
            .query(&[("is_tagged", "false"), ("page_size", "1")]);
        match self.get_json::<CountOnly>(req).await {
            Ok(c) => Some(c.count),
            Err(err) => {
                tracing::debug!(error = %err, "untagged count unavailable");
                None
            }
        }
    }

    async fn storage_used(&self) -> Option<String> {
        match self.get_json::<ServerStatus>(self.get(STATUS_PATH)).await {
            Ok(status) => status.storage.map(|s| human_size(s.used())),
            Err(err) => {
                tracing::debug!(error = %err, "storage status unavailable");
                None
            }
        }
    }
}

/// Map a transport error onto the failure taxonomy. Connection failures keep
/// the innermost cause so `last_error` says *why* (refused, DNS, reset).
pub(crate) fn classify_reqwest_error(err: reqwest::Error) -> PollFailure {
    if err.is_timeout() {
        return PollFailure::Timeout;
    }
    if err.is_connect() {
        return PollFailure::Offline(error_chain(&err));
    }
    if err.is_decode() {
        return PollFailure::Payload(error_chain(&err));
    }
    PollFailure::Unexpected(error_chain(&err))
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}
