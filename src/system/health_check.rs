use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::InnerState;

pub async fn health_check(State(inner): State<InnerState>) -> Json<Value> {
    let snapshot = inner.catalog.snapshot().await;
    let last_error = inner.catalog.last_error().await;

    Json(json!({
        "status": if last_error.is_none() { "ok" } else { "degraded" },
        "mode": inner.catalog.mode(),
        "version": snapshot.version(),
        "videos": snapshot.len(),
        "lastError": last_error,
    }))
}
