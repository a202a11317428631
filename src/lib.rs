// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod change_detector;
pub mod client;
pub mod config;
pub mod metrics;
pub mod notify;
pub mod poller;
pub mod scheduler;
pub mod status;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::change_detector::{KnownDocuments, NewDocumentEvent, Notification};
pub use crate::client::{PaperlessApi, PaperlessClient};
pub use crate::config::EndpointConfig;
pub use crate::notify::{Notifier, NotifierMux};
pub use crate::poller::Poller;
pub use crate::scheduler::{spawn_poll_loop, SensorRunner, Throttle, UpdateOutcome};
pub use crate::status::{PollFailure, PollResult, SensorAttributes, SensorState, SensorStatus};

use std::sync::Arc;

/// Wire a runner for `cfg` with the real HTTP client and the given channels.
pub fn build_runner(
    cfg: EndpointConfig,
    notifier: NotifierMux,
) -> anyhow::Result<SensorRunner<PaperlessClient>> {
    let client = PaperlessClient::new(&cfg)?;
    let poller = Poller::new(client, Arc::new(notifier));
    Ok(SensorRunner::new(cfg, poller))
}
