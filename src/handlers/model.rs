//! Loaded model description

use axum::{extract::State, Json};

use crate::classifier::ModelMetadata;
use crate::AppState;

pub async fn info(State(state): State<AppState>) -> Json<ModelMetadata> {
    Json(state.model.metadata().clone())
}
