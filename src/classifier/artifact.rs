//! Model Artifact - serialized, pre-fit classification pipeline
//!
//! The artifact is a JSON export of a fitted pipeline: the ordered class
//! labels, the input columns and their encoding, and the estimator weights.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use super::estimator::{Estimator, EstimatorSpec};
use super::pipeline::PipelineClassifier;
use super::schema::{FeatureSchema, FeatureSpec};

/// The model artifact cannot be turned into a classifier
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("model artifact failed validation: {0}")]
    Schema(#[from] ValidationErrors),

    #[error("model artifact is inconsistent: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ModelArtifact {
    #[validate(range(min = 1, max = 1))]
    pub format_version: u32,

    #[validate(length(min = 1))]
    pub name: String,

    #[validate(length(min = 2))]
    pub classes: Vec<String>,

    #[validate(length(min = 1))]
    pub features: Vec<FeatureSpec>,

    pub estimator: EstimatorSpec,
}

/// Load-time knobs that are not part of the artifact itself
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Reject request keys the artifact does not declare
    pub strict_features: bool,
}

impl ModelArtifact {
    /// Decode and validate artifact bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Read an artifact from disk. Returns the raw bytes alongside so the
    /// caller can fingerprint exactly what was loaded.
    pub fn read(path: &Path) -> Result<(Self, Vec<u8>), ArtifactError> {
        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::Missing(path.to_path_buf())
            } else {
                ArtifactError::Io { path: path.to_path_buf(), source }
            }
        })?;
        let artifact = Self::from_slice(&bytes)?;
        Ok((artifact, bytes))
    }

    /// Check cross-field consistency and build the classifier
    pub fn compile(self, options: LoadOptions) -> Result<PipelineClassifier, ArtifactError> {
        let mut seen = HashSet::new();
        for class in &self.classes {
            if class.is_empty() {
                return Err(ArtifactError::Invalid("empty class label".into()));
            }
            if !seen.insert(class.as_str()) {
                return Err(ArtifactError::Invalid(format!("class `{}` listed twice", class)));
            }
        }

        let schema = FeatureSchema::new(self.features, options.strict_features)?;
        let estimator = Estimator::compile(self.estimator, self.classes.len(), schema.width())?;

        Ok(PipelineClassifier::new(self.classes, schema, estimator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::classifier::fixtures::TREND_ARTIFACT;

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TREND_ARTIFACT.as_bytes()).unwrap();

        let (artifact, bytes) = ModelArtifact::read(file.path()).unwrap();
        assert_eq!(artifact.name, "mental_health_trend");
        assert_eq!(artifact.classes.len(), 3);
        assert_eq!(bytes, TREND_ARTIFACT.as_bytes());

        let classifier = tokio_test::assert_ok!(artifact.compile(LoadOptions::default()));
        assert_eq!(classifier.schema().width(), 2);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::read(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing(_)));
    }

    #[test]
    fn test_corrupt_file() {
        let err = ModelArtifact::from_slice(b"\x80\x04\x95pickle").unwrap_err();
        assert!(matches!(err, ArtifactError::Decode(_)));

        let err = ModelArtifact::from_slice(br#"{"format_version": 1}"#).unwrap_err();
        assert!(matches!(err, ArtifactError::Decode(_)));
    }

    #[test]
    fn test_validation_rules() {
        let single_class = TREND_ARTIFACT.replace(
            r#"["stable", "declining", "improving"]"#,
            r#"["stable"]"#,
        );
        let err = ModelArtifact::from_slice(single_class.as_bytes()).unwrap_err();
        assert!(matches!(err, ArtifactError::Schema(_)));

        let future = TREND_ARTIFACT.replace(r#""format_version": 1"#, r#""format_version": 2"#);
        let err = ModelArtifact::from_slice(future.as_bytes()).unwrap_err();
        assert!(matches!(err, ArtifactError::Schema(_)));
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let duplicate = TREND_ARTIFACT.replace(
            r#"["stable", "declining", "improving"]"#,
            r#"["stable", "declining", "stable"]"#,
        );
        let artifact = ModelArtifact::from_slice(duplicate.as_bytes()).unwrap();
        let err = artifact.compile(LoadOptions::default()).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid(_)));
    }

    #[test]
    fn test_estimator_must_match_schema() {
        let narrow = TREND_ARTIFACT.replace("[0.1, 0.2]", "[0.1]");
        let artifact = ModelArtifact::from_slice(narrow.as_bytes()).unwrap();
        assert!(artifact.compile(LoadOptions::default()).is_err());
    }
}
