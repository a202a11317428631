use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::client::PaperlessApi;
use crate::metrics::Metrics;
use crate::scheduler::{SensorRunner, UpdateOutcome};
use crate::status::SensorSnapshot;

#[derive(Serialize)]
struct RefreshResp {
    #[serde(flatten)]
    outcome: UpdateOutcome,
    snapshot: SensorSnapshot,
}

/// Dashboard-facing routes for one sensor.
pub fn router<A>(runner: Arc<SensorRunner<A>>) -> Router
where
    A: PaperlessApi + 'static,
{
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/status", get(status::<A>))
        .route("/refresh", post(refresh::<A>))
        .layer(CorsLayer::very_permissive())
        .with_state(runner)
}

/// `router` plus `/metrics`.
pub fn router_with_metrics<A>(runner: Arc<SensorRunner<A>>, metrics: &Metrics) -> Router
where
    A: PaperlessApi + 'static,
{
    router(runner).merge(metrics.router())
}

async fn status<A: PaperlessApi + 'static>(
    State(runner): State<Arc<SensorRunner<A>>>,
) -> Json<SensorSnapshot> {
    Json(runner.snapshot())
}

async fn refresh<A: PaperlessApi + 'static>(
    State(runner): State<Arc<SensorRunner<A>>>,
) -> Json<RefreshResp> {
    let outcome = runner.update().await;
    Json(RefreshResp {
        outcome,
        snapshot: runner.snapshot(),
    })
}
