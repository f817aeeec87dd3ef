//! Liveness probe

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model: String,
    labels: usize,
    uptime_secs: i64,
}

/// The holder is populated before the listener starts, so reaching this
/// handler already implies a usable model.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let metadata = state.model.metadata();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model: metadata.name.clone(),
        labels: metadata.labels.len(),
        uptime_secs: (chrono::Utc::now() - metadata.loaded_at).num_seconds(),
    })
}
