//! Paperless status service: binary entrypoint.
//! Loads config, starts the poll loop, and serves the status API.

use std::sync::Arc;

use anyhow::Context;
use paperless_status::{
    api, build_runner, config, metrics::Metrics, spawn_poll_loop, EndpointConfig, NotifierMux,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` picks the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("paperless_status=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = EndpointConfig::load_default().context("loading Paperless config")?;
    let bind = config::bind_addr_from_env()?;
    tracing::info!(
        base_url = %cfg.base_url(),
        name = %cfg.name,
        interval_secs = cfg.scan_interval().as_secs(),
        "starting Paperless status sensor"
    );

    let interval = cfg.scan_interval();
    // Recorder first so the first tick is already counted.
    let metrics = match Metrics::init(interval.as_secs()) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "metrics disabled");
            None
        }
    };

    let runner = Arc::new(build_runner(cfg, NotifierMux::from_env())?);
    let _poll_loop = spawn_poll_loop(runner.clone(), interval);

    let app = match &metrics {
        Some(m) => api::router_with_metrics(runner, m),
        None => api::router(runner),
    };

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(%bind, "status API listening");
    axum::serve(listener, app).await.context("serving status API")?;
    Ok(())
}
