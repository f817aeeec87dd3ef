//! Classifier - the opaque prediction capability behind the endpoint
//!
//! The endpoint only ever sees the [`Classifier`] trait. The concrete model is
//! a [`pipeline::PipelineClassifier`] compiled from a JSON artifact at startup and held
//! by the [`ModelHolder`].

pub mod artifact;
pub mod estimator;
pub mod holder;
pub mod pipeline;
pub mod probabilities;
pub mod record;
pub mod schema;

#[cfg(test)]
pub(crate) mod fixtures;

use thiserror::Error;

// Re-export common types
pub use artifact::{ArtifactError, LoadOptions};
pub use holder::{ModelHolder, ModelMetadata};
pub use probabilities::Probabilities;
pub use record::{FeatureRecord, RecordError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    /// The record does not fit what the model was trained on
    #[error("{0}")]
    InvalidInput(String),

    /// The model failed for reasons unrelated to the input
    #[error("inference failed: {0}")]
    Internal(String),
}

/// Prediction capability of a trained model.
///
/// Implementations are shared read-only across concurrent requests.
pub trait Classifier: Send + Sync {
    /// Labels in the model's own order
    fn labels(&self) -> &[String];

    /// Probability of every label for one record
    fn classify_probabilities(&self, record: &FeatureRecord)
        -> Result<Probabilities, ClassifierError>;

    /// Most likely label for one record
    fn classify_one(&self, record: &FeatureRecord) -> Result<String, ClassifierError> {
        let probabilities = self.classify_probabilities(record)?;
        probabilities
            .argmax()
            .map(|(label, _)| label.to_string())
            .ok_or_else(|| ClassifierError::Internal("empty probability mapping".into()))
    }
}
