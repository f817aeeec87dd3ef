//! Pipeline Classifier - feature encoding followed by an estimator

use super::estimator::Estimator;
use super::probabilities::Probabilities;
use super::record::FeatureRecord;
use super::schema::FeatureSchema;
use super::{Classifier, ClassifierError};

/// Classifier built from a loaded artifact. Immutable once compiled.
#[derive(Debug, Clone)]
pub struct PipelineClassifier {
    classes: Vec<String>,
    schema: FeatureSchema,
    estimator: Estimator,
}

impl PipelineClassifier {
    pub fn new(classes: Vec<String>, schema: FeatureSchema, estimator: Estimator) -> Self {
        Self { classes, schema, estimator }
    }

    #[cfg(test)]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}

impl Classifier for PipelineClassifier {
    fn labels(&self) -> &[String] {
        &self.classes
    }

    fn classify_probabilities(
        &self,
        record: &FeatureRecord,
    ) -> Result<Probabilities, ClassifierError> {
        let encoded = self.schema.encode(record)?;
        let values = self.estimator.predict_proba(&encoded)?;
        if values.len() != self.classes.len() {
            return Err(ClassifierError::Internal(format!(
                "estimator produced {} probabilities for {} classes",
                values.len(),
                self.classes.len()
            )));
        }
        Ok(Probabilities::from_labels(&self.classes, &values))
    }
}
