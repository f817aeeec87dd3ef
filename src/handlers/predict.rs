//! Inference handler

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};

use crate::classifier::probabilities::SUM_TOLERANCE;
use crate::classifier::{Classifier, FeatureRecord};
use crate::models::PredictionResponse;
use crate::{AppError, AppResult, AppState};

/// `POST /predict`: classify one Feature Record
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Json<PredictionResponse>> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            tracing::debug!("Failed to read request body: {}", rejection);
            AppError::InvalidBody
        }
    })?;

    let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Malformed JSON body: {}", e);
        AppError::InvalidBody
    })?;
    let record = FeatureRecord::try_from(value)?;
    tracing::debug!(features = record.len(), "Prediction requested");

    // CPU-bound; a panic inside the classifier surfaces as a JoinError.
    let classifier = state.model.classifier();
    let response = tokio::task::spawn_blocking(move || run_inference(classifier.as_ref(), &record))
        .await
        .map_err(|e| AppError::InternalError(format!("inference task aborted: {}", e)))??;

    Ok(Json(response))
}

/// Run both classifier operations and check the result is coherent
pub fn run_inference(
    classifier: &dyn Classifier,
    record: &FeatureRecord,
) -> AppResult<PredictionResponse> {
    let trend = classifier.classify_one(record)?;
    let probabilities = classifier.classify_probabilities(record)?;

    probabilities
        .check_distribution()
        .map_err(AppError::InternalError)?;
    if probabilities.len() != classifier.labels().len() {
        return Err(AppError::InternalError(format!(
            "{} probabilities for {} labels",
            probabilities.len(),
            classifier.labels().len()
        )));
    }

    let trend_probability = probabilities.get(&trend).ok_or_else(|| {
        AppError::InternalError(format!(
            "predicted label `{}` missing from probabilities",
            trend
        ))
    })?;
    if let Some(max) = probabilities.max() {
        if trend_probability + SUM_TOLERANCE < max {
            return Err(AppError::InternalError(format!(
                "predicted label `{}` is not the most probable",
                trend
            )));
        }
    }

    tracing::debug!(trend = %trend, probability = trend_probability, "Prediction served");

    Ok(PredictionResponse { trend, probabilities })
}
