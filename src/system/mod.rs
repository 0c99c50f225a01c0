//! Health and metrics routes.

pub mod health_check;

use axum::routing::get;
use axum::Router;
use axum_prometheus::metrics_exporter_prometheus::PrometheusHandle;

use crate::InnerState;

pub fn create_system_router() -> Router<InnerState> {
    Router::new().route("/health", get(health_check::health_check))
}

/// `/metrics`, rendered from the process-wide Prometheus recorder.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}
