use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::Notifier;
use crate::change_detector::{NewDocumentEvent, Notification, NEW_DOCUMENT_EVENT};

/// Home Assistant REST API: fires `paperless_new_document` on the event bus
/// and creates a `persistent_notification`.
pub struct HomeAssistantNotifier {
    base_url: String,
    token: String,
    client: Client,
}

const POST_TIMEOUT: Duration = Duration::from_secs(10);

impl HomeAssistantNotifier {
    /// Enabled only when both `HASS_URL` and `HASS_TOKEN` are set.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("HASS_URL").ok().filter(|s| !s.trim().is_empty())?;
        let token = std::env::var("HASS_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty())?;
        Some(Self::new(url, token))
    }

    pub fn new(base_url: String, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .post(&url)
            .bearer_auth(&self.token)
            .timeout(POST_TIMEOUT)
            .json(body)
            .send()
            .await
            .with_context(|| format!("home assistant post {path}"))?
            .error_for_status()
            .with_context(|| format!("home assistant non-2xx on {path}"))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for HomeAssistantNotifier {
    fn name(&self) -> &'static str {
        "home_assistant"
    }

    async fn publish_event(&self, ev: &NewDocumentEvent) -> Result<()> {
        self.post(&format!("/api/events/{NEW_DOCUMENT_EVENT}"), ev)
            .await
    }

    async fn send_notification(&self, note: &Notification) -> Result<()> {
        self.post("/api/services/persistent_notification/create", note)
            .await
    }
}
