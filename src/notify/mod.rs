pub mod discord;
pub mod home_assistant;

use std::sync::Arc;

use anyhow::Result;
use metrics::counter;

use crate::change_detector::{NewDocumentEvent, Notification};

pub use discord::DiscordNotifier;
pub use home_assistant::HomeAssistantNotifier;

/// One destination for new-document side effects.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Structured event for automations.
    async fn publish_event(&self, ev: &NewDocumentEvent) -> Result<()>;

    /// Human-readable notification.
    async fn send_notification(&self, note: &Notification) -> Result<()>;
}

/// Writes both side effects to the log. Always part of the mux so nothing
/// is silently dropped when no remote channel is configured.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish_event(&self, ev: &NewDocumentEvent) -> Result<()> {
        tracing::info!(
            document_id = ev.document_id,
            title = %ev.title,
            created = ?ev.created,
            has_preview = ev.preview.is_some(),
            "new document"
        );
        Ok(())
    }

    async fn send_notification(&self, note: &Notification) -> Result<()> {
        tracing::debug!(id = %note.notification_id, title = %note.title, "notification");
        Ok(())
    }
}

/// Fans out to every configured channel. A failing channel is logged and
/// counted; the others still run.
#[derive(Clone, Default)]
pub struct NotifierMux {
    channels: Vec<Arc<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log channel plus whatever `HASS_URL`/`HASS_TOKEN` and
    /// `DISCORD_WEBHOOK_URL` enable.
    pub fn from_env() -> Self {
        let mut mux = Self::new().with(LogNotifier);
        if let Some(ha) = HomeAssistantNotifier::from_env() {
            tracing::info!(url = %ha.base_url(), "Home Assistant notifier enabled");
            mux = mux.with(ha);
        }
        if let Some(discord) = DiscordNotifier::from_env() {
            tracing::info!("Discord notifier enabled");
            mux = mux.with(discord);
        }
        mux
    }

    pub fn with<N: Notifier + 'static>(mut self, n: N) -> Self {
        self.channels.push(Arc::new(n));
        self
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Publish the event, then send the notification, on every channel.
    pub async fn announce(&self, ev: &NewDocumentEvent) {
        let note = Notification::for_document(ev);
        for ch in &self.channels {
            if let Err(e) = ch.publish_event(ev).await {
                tracing::warn!(
                    channel = ch.name(),
                    document_id = ev.document_id,
                    error = %format!("{e:#}"),
                    "event publish failed"
                );
                counter!("paperless_notify_errors_total", "channel" => ch.name()).increment(1);
            }
            if let Err(e) = ch.send_notification(&note).await {
                tracing::warn!(
                    channel = ch.name(),
                    document_id = ev.document_id,
                    error = %format!("{e:#}"),
                    "notification failed"
                );
                counter!("paperless_notify_errors_total", "channel" => ch.name()).increment(1);
            }
        }
    }
}
