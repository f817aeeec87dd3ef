//! Prediction response

use serde::Serialize;

use crate::classifier::Probabilities;

/// Body of a successful `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    /// Predicted label
    pub trend: String,
    /// Probability of every label, in model order
    pub probabilities: Probabilities,
}
