use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::Notifier;
use crate::change_detector::{NewDocumentEvent, Notification};

/// Discord webhook channel. Discord cannot render data-URI images, so the
/// embed carries text only.
#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    max_retries: u8,
}

const POST_TIMEOUT: Duration = Duration::from_secs(5);

impl DiscordNotifier {
    pub fn from_env() -> Option<Self> {
        std::env::var("DISCORD_WEBHOOK_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Self::new)
    }

    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            max_retries: 3,
        }
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    async fn post(&self, payload: &DiscordWebhookPayload) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(POST_TIMEOUT)
                .json(payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("Discord webhook HTTP error: {e}"),
                },
                Err(e) => anyhow!("Discord webhook request failed: {e}"),
            };
            if attempt >= self.max_retries {
                return Err(err);
            }
            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
        }
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    // The notification already covers the user-facing side.
    async fn publish_event(&self, _ev: &NewDocumentEvent) -> Result<()> {
        Ok(())
    }

    async fn send_notification(&self, note: &Notification) -> Result<()> {
        let description = note
            .message
            .split("\n\n![Preview]")
            .next()
            .unwrap_or_default()
            .to_string();
        let payload = DiscordWebhookPayload::embed(&note.title, &description);
        self.post(&payload).await
    }
}

#[derive(Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
}

#[derive(Serialize)]
struct DiscordWebhookPayload {
    content: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

impl DiscordWebhookPayload {
    fn embed(title: &str, description: &str) -> Self {
        Self {
            content: None,
            embeds: vec![DiscordEmbed {
                title: title.to_string(),
                description: description.to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn strips_inline_preview_from_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "embeds": [{
                    "title": "New Paperless document",
                    "description": "New document: Payslip"
                }]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let discord = DiscordNotifier::new(server.uri()).with_retries(1);
        let ev = NewDocumentEvent {
            document_id: 3,
            title: "Payslip".into(),
            created: None,
            preview: Some("iVBORw0KGgo=".into()),
        };
        discord
            .send_notification(&Notification::for_document(&ev))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let discord = DiscordNotifier::new(server.uri()).with_retries(2);
        let note = Notification {
            title: "t".into(),
            message: "m".into(),
            notification_id: "n".into(),
        };
        assert!(discord.send_notification(&note).await.is_err());
    }
}
